//! Block layout for the letter: margins, text measurement, and [Flow], the
//! top-to-bottom composer that turns paragraphs and images into positioned
//! page contents.

use crate::colour::{colours, Colour};
use crate::document::Document;
use crate::font::Font;
use crate::image::Image;
use crate::page::{ImageLayout, Page, SpanFont, SpanLayout};
use crate::rect::Rect;
use crate::units::Pt;
use id_arena::Id;
use owned_ttf_parser::AsFaceRef;

/// Margins are applied to [Page]s to derive the content box that layout
/// stays within; they also become the `ArtBox` attribute of each page in the
/// generated PDF
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Margins {
    pub top: Pt,
    pub right: Pt,
    pub bottom: Pt,
    pub left: Pt,
}

impl Margins {
    /// Create margins by specifying individual components in a clockwise
    /// fashion starting at the top (in the same order as CSS margins)
    pub fn trbl(top: Pt, right: Pt, bottom: Pt, left: Pt) -> Margins {
        Margins {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Create margins where all values are equal
    pub fn all(value: Pt) -> Margins {
        Margins {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Create margins with one vertical (top and bottom) and one horizontal
    /// (left and right) value
    pub fn symmetric(vertical: Pt, horizontal: Pt) -> Margins {
        Margins {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }
}

/// Calculate the width of a string of text in the given font and size.
/// Characters the face has no glyph for measure as the replacement glyph.
pub fn width_of_text(text: &str, font: &Font, size: Pt) -> Pt {
    let scaling = size.0 / font.face.as_face_ref().units_per_em() as f32;
    text.chars()
        .filter_map(|ch| font.glyph_id(ch).or_else(|| font.replacement_glyph_id()))
        .map(|gid| {
            Pt(font
                .face
                .as_face_ref()
                .glyph_hor_advance(owned_ttf_parser::GlyphId(gid))
                .unwrap_or_default() as f32
                * scaling)
        })
        .sum()
}

/// A run of text in one face and size. Paragraphs are sequences of runs, so
/// a line can switch faces mid-sentence ("Dear " regular, the name in bold).
#[derive(Clone, Debug)]
pub struct StyledText {
    pub text: String,
    pub font: SpanFont,
    pub colour: Colour,
}

impl StyledText {
    pub fn new<S: Into<String>>(text: S, font: SpanFont) -> StyledText {
        StyledText {
            text: text.into(),
            font,
            colour: colours::BLACK,
        }
    }
}

enum Token {
    Word {
        text: String,
        font: SpanFont,
        colour: Colour,
        width: Pt,
    },
    Break,
}

/// Composes a page as a single top-to-bottom flow of blocks, the way the
/// letter template reads: a cursor starts at the top of the content box and
/// every paragraph, image, or gap moves it down. Negative gaps move it up,
/// which the letterhead uses to sit partly inside the top margin.
pub struct Flow {
    page: Page,
    cursor: Pt,
}

impl Flow {
    pub fn new(page: Page) -> Flow {
        let cursor = page.content_box.y2;
        Flow { page, cursor }
    }

    /// The y coordinate the next block will be placed at
    pub fn cursor(&self) -> Pt {
        self.cursor
    }

    /// Insert vertical whitespace before the next block
    pub fn advance(&mut self, gap: Pt) {
        self.cursor -= gap;
    }

    /// Place an image at the left edge of the content box, scaled to
    /// `width` x `height`
    pub fn image(&mut self, id: Id<Image>, width: Pt, height: Pt) {
        let x1 = self.page.content_box.x1;
        let y2 = self.cursor;
        self.page.add_image(ImageLayout {
            image: id,
            position: Rect {
                x1,
                y1: y2 - height,
                x2: x1 + width,
                y2,
            },
        });
        self.cursor -= height;
    }

    /// Lay out a paragraph of styled runs, wrapping at word boundaries
    /// within the content box. An embedded `\n` forces a line break; two in
    /// a row produce a blank line. Lines are spaced by the fixed `leading`.
    pub fn paragraph(&mut self, doc: &Document, runs: &[StyledText], leading: Pt) {
        let Some(first) = runs.first() else {
            return;
        };

        let left = self.page.content_box.x1;
        let right = self.page.content_box.x2;

        let mut tokens: Vec<Token> = Vec::new();
        for run in runs {
            for (li, line) in run.text.split('\n').enumerate() {
                if li > 0 {
                    tokens.push(Token::Break);
                }
                for word in line.split_whitespace() {
                    tokens.push(Token::Word {
                        text: word.to_string(),
                        font: run.font,
                        colour: run.colour,
                        width: width_of_text(word, &doc.fonts[run.font.id], run.font.size),
                    });
                }
            }
        }

        let mut x = left;
        let mut y = self.cursor - doc.fonts[first.font.id].ascent(first.font.size);
        let mut line_has_words = false;
        // the span being accumulated on the current line; flushed whenever
        // the line ends or the style changes
        let mut open: Option<SpanLayout> = None;

        for token in tokens {
            match token {
                Token::Break => {
                    if let Some(span) = open.take() {
                        self.page.add_span(span);
                    }
                    x = left;
                    y -= leading;
                    line_has_words = false;
                }
                Token::Word {
                    text,
                    font,
                    colour,
                    width,
                } => {
                    let space = width_of_text(" ", &doc.fonts[font.id], font.size);

                    if line_has_words && x + space + width > right {
                        if let Some(span) = open.take() {
                            self.page.add_span(span);
                        }
                        x = left;
                        y -= leading;
                        line_has_words = false;
                    }

                    match open.as_mut() {
                        Some(span)
                            if line_has_words && span.font == font && span.colour == colour =>
                        {
                            span.text.push(' ');
                            span.text.push_str(&text);
                            x += space + width;
                        }
                        _ => {
                            if let Some(span) = open.take() {
                                self.page.add_span(span);
                            }
                            let start_x = if line_has_words { x + space } else { x };
                            open = Some(SpanLayout {
                                text,
                                font,
                                colour,
                                coords: (start_x, y),
                            });
                            x = start_x + width;
                        }
                    }
                    line_has_words = true;
                }
            }
        }
        if let Some(span) = open.take() {
            self.page.add_span(span);
        }

        // the block ends at the bottom of its final line
        self.cursor = y + doc.fonts[first.font.id].descent(first.font.size);
    }

    pub fn into_page(self) -> Page {
        self.page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::PageContents;
    use crate::pagesize;

    const REGULAR: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
    const BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");

    fn test_doc() -> (Document, SpanFont, SpanFont) {
        let mut doc = Document::default();
        let regular = doc.add_font(Font::load(REGULAR.to_vec()).expect("regular face parses"));
        let bold = doc.add_font(Font::load(BOLD.to_vec()).expect("bold face parses"));
        (
            doc,
            SpanFont {
                id: regular,
                size: Pt(11.0),
            },
            SpanFont {
                id: bold,
                size: Pt(11.0),
            },
        )
    }

    fn spans_of(page: &Page) -> Vec<SpanLayout> {
        page.contents
            .iter()
            .filter_map(|c| match c {
                PageContents::Text(spans) => Some(spans.clone()),
                PageContents::Image(_) => None,
            })
            .flatten()
            .collect()
    }

    #[test]
    fn long_paragraphs_wrap_inside_the_content_box() {
        let (doc, body, _) = test_doc();
        let page = Page::new(pagesize::LETTER, Some(Margins::all(Pt(50.0))));
        let mut flow = Flow::new(page);
        let text = "Congratulations! I am pleased to inform that based on your recently \
                    pulled credit report, a review of your income and asset documentation, \
                    you have been pre-approved for a mortgage loan subject to the following \
                    terms and conditions:";
        flow.paragraph(&doc, &[StyledText::new(text, body)], Pt(15.0));
        let page = flow.into_page();

        let spans = spans_of(&page);
        assert!(spans.len() > 1, "paragraph should wrap onto several lines");
        for span in &spans {
            let width = width_of_text(&span.text, &doc.fonts[span.font.id], span.font.size);
            assert!(span.coords.0 >= page.content_box.x1);
            assert!(span.coords.0 + width <= page.content_box.x2 + Pt(0.01));
        }
    }

    #[test]
    fn forced_breaks_advance_the_baseline_by_the_leading() {
        let (doc, body, _) = test_doc();
        let page = Page::new(pagesize::LETTER, Some(Margins::all(Pt(50.0))));
        let mut flow = Flow::new(page);
        flow.paragraph(&doc, &[StyledText::new("one\ntwo\n\nthree", body)], Pt(15.0));
        let spans = spans_of(&flow.into_page());

        assert_eq!(spans.len(), 3);
        let y0 = spans[0].coords.1 .0;
        assert!((spans[1].coords.1 .0 - (y0 - 15.0)).abs() < 0.01);
        // the double break leaves one blank line
        assert!((spans[2].coords.1 .0 - (y0 - 45.0)).abs() < 0.01);
    }

    #[test]
    fn mixed_face_runs_share_a_baseline() {
        let (doc, body, emphasis) = test_doc();
        let page = Page::new(pagesize::LETTER, Some(Margins::all(Pt(50.0))));
        let mut flow = Flow::new(page);
        flow.paragraph(
            &doc,
            &[
                StyledText::new("Dear ", body),
                StyledText::new("Sanjaya Regimi,", emphasis),
            ],
            Pt(15.0),
        );
        let spans = spans_of(&flow.into_page());

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].coords.1, spans[1].coords.1);
        assert!(spans[1].coords.0 > spans[0].coords.0);
        assert_eq!(spans[1].text, "Sanjaya Regimi,");
    }

    #[test]
    fn images_consume_their_height() {
        let (mut doc, _, _) = test_doc();
        let logo = doc.add_image(crate::image::Image::from_raster(
            image::DynamicImage::new_rgb8(180, 70),
        ));
        let page = Page::new(pagesize::LETTER, Some(Margins::all(Pt(50.0))));
        let top = page.content_box.y2;
        let mut flow = Flow::new(page);
        flow.image(logo, Pt(129.6), Pt(50.4));
        assert_eq!(flow.cursor(), top - Pt(50.4));
    }
}
