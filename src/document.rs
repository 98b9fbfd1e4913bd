use crate::{font::Font, image::Image, info::Info, page::Page, refs::{ObjectReferences, RefType}, LetterError};
use id_arena::{Arena, Id};
use pdf_writer::{Pdf, Ref};
use std::io::Write;

/// The in-memory document: fonts, images, and laid-out pages, rendered to
/// PDF bytes with a call to [Document::write]
#[derive(Default)]
pub struct Document {
    pub info: Option<Info>,
    pub pages: Arena<Page>,
    pub fonts: Arena<Font>,
    pub images: Arena<Image>,
}

impl Document {
    /// Sets metadata about the document. If not provided, no information
    /// block will be written to the PDF
    pub fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    /// Add a page to the end of the document, returning its id. Pages render
    /// in the order they were added.
    pub fn add_page(&mut self, page: Page) -> Id<Page> {
        self.pages.alloc(page)
    }

    /// Add a font to the document. Fonts are stored document-wide so any
    /// page can use them through the returned id.
    pub fn add_font(&mut self, font: Font) -> Id<Font> {
        self.fonts.alloc(font)
    }

    /// Add an image to the document. Like fonts, images are stored
    /// document-wide and can be placed on any page by id.
    pub fn add_image(&mut self, image: Image) -> Id<Image> {
        self.images.alloc(image)
    }

    /// Serialize the entire document to the writer. The document is rendered
    /// in memory first, so the only failures are asset encoding and the final
    /// write to `w`. Until `write` is called nothing is committed; fonts,
    /// images, and pages can be added freely.
    pub fn write<W: Write>(self, mut w: W) -> Result<(), LetterError> {
        let Document {
            info,
            pages,
            fonts,
            images,
        } = self;

        let mut refs = ObjectReferences::new();

        let catalog_id = refs.gen(RefType::Catalog);
        let page_tree_id = refs.gen(RefType::PageTree);

        let mut writer = Pdf::new();
        if let Some(info) = info {
            info.write(&mut refs, &mut writer);
        }

        let page_refs: Vec<Ref> = pages
            .iter()
            .map(|(id, _)| refs.gen(RefType::Page(id.index())))
            .collect();

        writer
            .pages(page_tree_id)
            .count(page_refs.len() as i32)
            .kids(page_refs);

        for (id, font) in fonts.iter() {
            font.write(&mut refs, id, &mut writer);
        }

        for (id, image) in images.iter() {
            image.write(&mut refs, id.index(), &mut writer)?;
        }

        for (id, page) in pages.iter() {
            page.write(&mut refs, id.index(), &fonts, &images, &mut writer);
        }

        writer.catalog(catalog_id).pages(page_tree_id);

        w.write_all(writer.finish().as_slice()).map_err(Into::into)
    }
}
