//! PDF encoding of a [`DocumentLayout`] with lopdf.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use super::layout::{DocumentLayout, Element, FontWeight, Rgb, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::RenderError;

const MM_TO_PT: f32 = 72.0 / 25.4;

fn pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

fn color_operands(color: Rgb) -> Vec<Object> {
    vec![
        real(color.0 as f32 / 255.0),
        real(color.1 as f32 / 255.0),
        real(color.2 as f32 / 255.0),
    ]
}

fn font_resource(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Regular => "F1",
        FontWeight::Bold => "F2",
    }
}

/// Map text onto WinAnsiEncoding; characters outside it become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (' '..='~').contains(&c) => c as u8,
            c if ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Encode the layout as a compressed PDF 1.5 document.
pub fn encode_layout(layout: &DocumentLayout) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::with_capacity(layout.page_count());
    for page in layout.pages() {
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();
        let mut image_count = 0usize;

        for element in &page.elements {
            match element {
                Element::Text {
                    x,
                    y,
                    size,
                    weight,
                    color,
                    text,
                } => {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("rg", color_operands(*color)));
                    operations.push(Operation::new(
                        "Tf",
                        vec![Object::Name(font_resource(*weight).as_bytes().to_vec()), real(*size)],
                    ));
                    operations.push(Operation::new(
                        "Td",
                        vec![real(pt(*x)), real(pt(PAGE_HEIGHT_MM - *y))],
                    ));
                    operations.push(Operation::new(
                        "Tj",
                        vec![Object::string_literal(encode_win_ansi(text))],
                    ));
                    operations.push(Operation::new("ET", vec![]));
                }
                Element::Rule { x1, x2, y, color } => {
                    let y_pt = pt(PAGE_HEIGHT_MM - *y);
                    operations.push(Operation::new("RG", color_operands(*color)));
                    operations.push(Operation::new("w", vec![real(0.5)]));
                    operations.push(Operation::new("m", vec![real(pt(*x1)), real(y_pt)]));
                    operations.push(Operation::new("l", vec![real(pt(*x2)), real(y_pt)]));
                    operations.push(Operation::new("S", vec![]));
                }
                Element::Image {
                    x,
                    y,
                    width,
                    height,
                    raster,
                } => {
                    image_count += 1;
                    let name = format!("Im{}", image_count);
                    let image_id = doc.add_object(Stream::new(
                        dictionary! {
                            "Type" => "XObject",
                            "Subtype" => "Image",
                            "Width" => Object::Integer(raster.width as i64),
                            "Height" => Object::Integer(raster.height as i64),
                            "ColorSpace" => "DeviceRGB",
                            "BitsPerComponent" => Object::Integer(8),
                        },
                        raster.rgb.clone(),
                    ));
                    xobjects.set(name.clone(), image_id);

                    operations.push(Operation::new("q", vec![]));
                    operations.push(Operation::new(
                        "cm",
                        vec![
                            real(pt(*width)),
                            real(0.0),
                            real(0.0),
                            real(pt(*height)),
                            real(pt(*x)),
                            real(pt(PAGE_HEIGHT_MM - *y - *height)),
                        ],
                    ));
                    operations.push(Operation::new(
                        "Do",
                        vec![Object::Name(name.into_bytes())],
                    ));
                    operations.push(Operation::new("Q", vec![]));
                }
            }
        }

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        };
        if image_count > 0 {
            resources.set("XObject", xobjects);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(kids.len() as i64),
        "Kids" => kids,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            real(pt(PAGE_WIDTH_MM)),
            real(pt(PAGE_HEIGHT_MM)),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(buffer)
}
