//! Plain-text PDF rendering with lopdf.
//!
//! Text is wrapped and paginated by `layout`, then written as one content
//! stream per page. With an embedded TrueType font the strings are
//! Identity-H glyph ids, and a ToUnicode map keeps the text extractable.

mod font;
mod layout;

pub use font::{PdfFont, TrueTypeFont};
pub use layout::PageGeometry;

use layout::layout;

use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::ArtifactError;

use font::{Metrics, winansi_bytes};

/// Resource name of the single font.
const FONT_RESOURCE: &str = "F1";

/// Renders text to PDF bytes.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    font: PdfFont,
    geometry: PageGeometry,
}

impl PdfRenderer {
    pub fn new(font: PdfFont) -> Self {
        Self {
            font,
            geometry: PageGeometry::a4(),
        }
    }

    pub fn font(&self) -> &PdfFont {
        &self.font
    }

    pub fn render(&self, text: &str) -> Result<Vec<u8>, ArtifactError> {
        let metrics = self.font.metrics()?;
        let size = self.geometry.font_size;
        let pages = layout(text, &self.geometry, |s| metrics.string_width(s, size));

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        // gid -> (char, width) for every glyph actually drawn
        let mut used_glyphs: BTreeMap<u16, (char, u16)> = BTreeMap::new();
        let mut kids = Vec::with_capacity(pages.len());

        for lines in &pages {
            let operations = self.page_operations(lines, &metrics, &mut used_glyphs);
            let content = Content { operations }.encode().map_err(render_error)?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let font_id = match &self.font {
            PdfFont::TrueType(font) => add_type0_font(&mut doc, font, &used_glyphs),
            PdfFont::Helvetica => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            }),
        };

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { FONT_RESOURCE => font_id },
        });
        let page_count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::from(self.geometry.width),
                Object::from(self.geometry.height),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buf = Vec::new();
        doc.save_to(&mut buf).map_err(render_error)?;
        Ok(buf)
    }

    fn page_operations(
        &self,
        lines: &[String],
        metrics: &Metrics<'_>,
        used_glyphs: &mut BTreeMap<u16, (char, u16)>,
    ) -> Vec<Operation> {
        let g = &self.geometry;
        let mut ops = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::from(FONT_RESOURCE), Object::from(g.font_size)],
            ),
            Operation::new(
                "Td",
                vec![Object::from(g.margin), Object::from(g.top())],
            ),
        ];

        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                ops.push(Operation::new(
                    "Td",
                    vec![Object::Integer(0), Object::from(-g.leading)],
                ));
            }
            if line.is_empty() {
                continue;
            }
            ops.push(Operation::new(
                "Tj",
                vec![self.encode_line(line, metrics, used_glyphs)],
            ));
        }

        ops.push(Operation::new("ET", vec![]));
        ops
    }

    fn encode_line(
        &self,
        line: &str,
        metrics: &Metrics<'_>,
        used_glyphs: &mut BTreeMap<u16, (char, u16)>,
    ) -> Object {
        match self.font {
            PdfFont::Helvetica => Object::String(winansi_bytes(line), StringFormat::Literal),
            PdfFont::TrueType(_) => {
                let mut bytes = Vec::with_capacity(line.len() * 2);
                for ch in line.chars() {
                    let gid = metrics.glyph_id(ch);
                    used_glyphs
                        .entry(gid)
                        .or_insert_with(|| (ch, metrics.char_width(ch)));
                    bytes.extend_from_slice(&gid.to_be_bytes());
                }
                Object::String(bytes, StringFormat::Hexadecimal)
            }
        }
    }
}

/// Embed `font` as a Type0/CIDFontType2 font with Identity-H encoding.
fn add_type0_font(
    doc: &mut Document,
    font: &TrueTypeFont,
    used_glyphs: &BTreeMap<u16, (char, u16)>,
) -> ObjectId {
    let font_file_id = doc.add_object(Stream::new(
        dictionary! { "Length1" => font.data.len() as i64 },
        font.data.clone(),
    ));

    let [x_min, y_min, x_max, y_max] = font.bbox;
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => Object::Name(font.name.as_bytes().to_vec()),
        "Flags" => 4,
        "FontBBox" => vec![
            Object::Integer(font.to_thousandths(i32::from(x_min))),
            Object::Integer(font.to_thousandths(i32::from(y_min))),
            Object::Integer(font.to_thousandths(i32::from(x_max))),
            Object::Integer(font.to_thousandths(i32::from(y_max))),
        ],
        "ItalicAngle" => 0,
        "Ascent" => font.to_thousandths(i32::from(font.ascender)),
        "Descent" => font.to_thousandths(i32::from(font.descender)),
        "CapHeight" => font.to_thousandths(i32::from(font.ascender)),
        "StemV" => 80,
        "FontFile2" => font_file_id,
    });

    let widths: Vec<Object> = used_glyphs
        .iter()
        .flat_map(|(gid, (_, width))| {
            [
                Object::Integer(i64::from(*gid)),
                Object::Array(vec![Object::Integer(i64::from(*width))]),
            ]
        })
        .collect();

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => Object::Name(font.name.as_bytes().to_vec()),
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "CIDToGIDMap" => "Identity",
        "W" => widths,
    });

    let to_unicode_id = doc.add_object(Stream::new(
        dictionary! {},
        to_unicode_cmap(used_glyphs).into_bytes(),
    ));

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => Object::Name(font.name.as_bytes().to_vec()),
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![Object::Reference(cid_font_id)],
        "ToUnicode" => to_unicode_id,
    })
}

/// ToUnicode CMap mapping each used glyph id back to its character.
fn to_unicode_cmap(used_glyphs: &BTreeMap<u16, (char, u16)>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let entries: Vec<(&u16, &(char, u16))> = used_glyphs.iter().collect();
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, (ch, _)) in chunk {
            let mut units = [0u16; 2];
            let utf16: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            cmap.push_str(&format!("<{gid:04X}> <{utf16}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap\n\
         CMapName currentdict /CMap defineresource pop\n\
         end\n\
         end\n",
    );
    cmap
}

fn render_error(e: impl std::fmt::Display) -> ArtifactError {
    ArtifactError::Render {
        format: "pdf".into(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn helvetica_render_is_deterministic() {
        let renderer = PdfRenderer::new(PdfFont::Helvetica);
        let first = renderer.render("Hello\nWorld").unwrap();
        let second = renderer.render("Hello\nWorld").unwrap();
        assert!(first.starts_with(b"%PDF-1.5"));
        assert_eq!(first, second);
    }

    #[test]
    fn rendered_text_is_extractable() {
        let bytes = PdfRenderer::new(PdfFont::Helvetica)
            .render("Hello\nWorld")
            .unwrap();
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Hello"));
        assert!(text.contains("World"));
    }

    #[test]
    fn long_text_spans_several_pages() {
        let text = (0..150).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let bytes = PdfRenderer::new(PdfFont::Helvetica).render(&text).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn cmap_maps_glyphs_to_utf16() {
        let mut used = BTreeMap::new();
        used.insert(0x0102u16, ('한', 1000u16));
        used.insert(0x0003u16, (' ', 250u16));
        let cmap = to_unicode_cmap(&used);
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0003> <0020>"));
        assert!(cmap.contains("<0102> <D55C>"));
    }

    fn fixture_font() -> PdfFont {
        let path = Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/DejaVuSans.ttf"
        ));
        PdfFont::load_or_default(Some(path))
    }

    #[test]
    fn truetype_render_is_deterministic_and_extractable() {
        let font = fixture_font();
        assert!(matches!(font, PdfFont::TrueType(_)));

        let renderer = PdfRenderer::new(font);
        let first = renderer.render("Hello\nWorld follow up").unwrap();
        let second = renderer.render("Hello\nWorld follow up").unwrap();
        assert_eq!(first, second);

        let text = pdf_extract::extract_text_from_mem(&first).unwrap();
        assert!(text.contains("Hello"), "{text}");
        assert!(text.contains("World follow up"), "{text}");
    }

    #[test]
    fn truetype_font_is_embedded_as_type0() {
        let bytes = PdfRenderer::new(fixture_font())
            .render("Discharge\n\nsummary")
            .unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);

        let subtype = |name: &[u8]| {
            doc.objects.values().any(|obj| {
                obj.as_dict().is_ok_and(|dict| {
                    matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == name)
                })
            })
        };
        assert!(subtype(b"Type0"));
        assert!(subtype(b"CIDFontType2"));
        assert!(!subtype(b"Type1"));
    }
}
