use crate::colour::Colour;
use crate::font::Font;
use crate::image::Image;
use crate::layout::Margins;
use crate::pagesize::PageSize;
use crate::rect::Rect;
use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;
use id_arena::{Arena, Id};
use pdf_writer::{Finish, Name, Pdf};
use std::io::Write;

/// A font selection for a span: which document font, at what size
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SpanFont {
    pub id: Id<Font>,
    pub size: Pt,
}

/// A run of already-positioned text. Coordinates are the baseline origin of
/// the first glyph.
#[derive(Clone, PartialEq, Debug)]
pub struct SpanLayout {
    pub text: String,
    pub font: SpanFont,
    pub colour: Colour,
    pub coords: (Pt, Pt),
}

/// An already-positioned image
#[derive(Clone, PartialEq, Debug)]
pub struct ImageLayout {
    pub image: Id<Image>,
    pub position: Rect,
}

#[derive(Clone, PartialEq, Debug)]
pub enum PageContents {
    Text(Vec<SpanLayout>),
    Image(ImageLayout),
}

pub struct Page {
    /// The size of the page
    pub media_box: Rect,
    /// Where content can live, i.e. within the margins
    pub content_box: Rect,
    /// The laid out spans and images
    pub contents: Vec<PageContents>,
}

impl Page {
    pub fn new(size: PageSize, margins: Option<Margins>) -> Page {
        let margins = margins.unwrap_or_default();
        Page {
            media_box: Rect {
                x1: Pt(0.0),
                y1: Pt(0.0),
                x2: size.0,
                y2: size.1,
            },
            content_box: Rect {
                x1: margins.left,
                y1: margins.bottom,
                x2: size.0 - margins.right,
                y2: size.1 - margins.top,
            },
            contents: Vec::default(),
        }
    }

    pub fn add_span(&mut self, span: SpanLayout) {
        self.contents.push(PageContents::Text(vec![span]));
    }

    pub fn add_image(&mut self, image: ImageLayout) {
        self.contents.push(PageContents::Image(image));
    }

    fn render(&self, fonts: &Arena<Font>) -> Vec<u8> {
        if self.contents.is_empty() {
            return Vec::default();
        }
        let mut content: Vec<u8> = Vec::default();

        for page_content in self.contents.iter() {
            match page_content {
                PageContents::Text(spans) => {
                    write!(&mut content, "q\n").unwrap();
                    for span in spans.iter() {
                        write!(
                            &mut content,
                            "/F{} {} Tf\n",
                            span.font.id.index(),
                            span.font.size
                        )
                        .unwrap();
                        match span.colour {
                            Colour::RGB { r, g, b } => {
                                write!(&mut content, "{r} {g} {b} rg\n").unwrap()
                            }
                            Colour::Grey { g } => write!(&mut content, "{g} g\n").unwrap(),
                        }

                        write!(&mut content, "BT\n").unwrap();
                        write!(&mut content, "{} {} Td\n", span.coords.0, span.coords.1).unwrap();
                        write!(&mut content, "<").unwrap();
                        let font = &fonts[span.font.id];
                        for ch in span.text.chars() {
                            let gid = font
                                .glyph_id(ch)
                                .or_else(|| font.replacement_glyph_id())
                                .unwrap_or_default();
                            write!(&mut content, "{gid:04x}").unwrap();
                        }
                        write!(&mut content, "> Tj\n").unwrap();
                        write!(&mut content, "ET\n").unwrap();
                    }
                    write!(&mut content, "Q\n").unwrap();
                }
                PageContents::Image(image) => {
                    write!(&mut content, "q\n").unwrap();
                    write!(
                        &mut content,
                        "{} 0 0 {} {} {} cm\n",
                        image.position.width(),
                        image.position.height(),
                        image.position.x1,
                        image.position.y1
                    )
                    .unwrap();
                    write!(&mut content, "/I{} Do\n", image.image.index()).unwrap();
                    write!(&mut content, "Q\n").unwrap();
                }
            }
        }

        content
    }

    pub(crate) fn write(
        &self,
        refs: &mut ObjectReferences,
        page_index: usize,
        fonts: &Arena<Font>,
        images: &Arena<Image>,
        writer: &mut Pdf,
    ) {
        let id = refs
            .get(RefType::Page(page_index))
            .expect("page refs are pre-generated");
        let mut page = writer.page(id);
        page.media_box(self.media_box.into());
        page.art_box(self.content_box.into());
        page.parent(refs.get(RefType::PageTree).expect("page tree ref exists"));

        let mut resources = page.resources();
        let mut resource_fonts = resources.fonts();
        for (fid, _) in fonts.iter() {
            resource_fonts.pair(
                Name(format!("F{}", fid.index()).as_bytes()),
                refs.get(RefType::Font(fid.index()))
                    .expect("fonts are written before pages"),
            );
        }
        resource_fonts.finish();
        let mut resource_xobjects = resources.x_objects();
        for (iid, _) in images.iter() {
            resource_xobjects.pair(
                Name(format!("I{}", iid.index()).as_bytes()),
                refs.get(RefType::Image(iid.index()))
                    .expect("images are written before pages"),
            );
        }
        resource_xobjects.finish();
        resources.finish();

        let content_id = refs.gen(RefType::ContentForPage(page_index));
        page.contents(content_id);
        page.finish();

        let rendered = self.render(fonts);
        writer.stream(content_id, rendered.as_slice());
    }
}
