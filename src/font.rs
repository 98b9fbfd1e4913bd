use crate::refs::{ObjectReferences, RefType};
use crate::units::Pt;
use crate::LetterError;
use id_arena::Id;
use owned_ttf_parser::{AsFaceRef, OwnedFace};
use pdf_writer::{
    types::{CidFontType, FontFlags, SystemInfo},
    Finish, Name, Pdf, Ref, Str,
};
use std::collections::HashMap;

/// A parsed TTF/OTF font. The letter faces are embedded in their entirety in
/// the generated PDF as CID-keyed Type0 fonts, so copied text and extraction
/// keep working in any reader.
///
/// Fonts are referred to throughout the crate by their [Id] within the
/// document, not by typed references.
pub struct Font {
    pub face: OwnedFace,
}

impl Font {
    /// Load a font from raw bytes, returning an error if the face could not
    /// be parsed
    pub fn load(bytes: Vec<u8>) -> Result<Font, LetterError> {
        let face = OwnedFace::from_vec(bytes, 0)?;
        Ok(Font { face })
    }

    /// Obtain the full name of the font. Panics if the font does not have a name
    pub fn name(&self) -> String {
        self.face
            .as_face_ref()
            .names()
            .into_iter()
            .find(|name| name.name_id == owned_ttf_parser::name_id::FULL_NAME && name.is_unicode())
            .and_then(|name| name.to_string())
            .expect("font face has a name")
    }

    /// Obtain the family name of the font. Panics if the font does not have a family
    pub fn family(&self) -> String {
        self.face
            .as_face_ref()
            .names()
            .into_iter()
            .find(|name| name.name_id == owned_ttf_parser::name_id::FAMILY && name.is_unicode())
            .and_then(|name| name.to_string())
            .expect("font face has a family")
    }

    /// Distance from the baseline to the top of the font at the given size
    pub fn ascent(&self, size: Pt) -> Pt {
        let scaling = size.0 / self.face.as_face_ref().units_per_em() as f32;
        Pt(self.face.as_face_ref().ascender() as f32 * scaling)
    }

    /// Distance from the baseline to the bottom of the font at the given size.
    /// Note: this is usually negative
    pub fn descent(&self, size: Pt) -> Pt {
        let scaling = size.0 / self.face.as_face_ref().units_per_em() as f32;
        Pt(self.face.as_face_ref().descender() as f32 * scaling)
    }

    pub fn glyph_id(&self, ch: char) -> Option<u16> {
        self.face.as_face_ref().glyph_index(ch).map(|i| i.0)
    }

    pub fn replacement_glyph_id(&self) -> Option<u16> {
        self.face.as_face_ref().glyph_index('\u{FFFD}').map(|i| i.0)
    }

    /// Map every glyph reachable from a unicode cmap subtable back to the
    /// character it renders, sorted by glyph id. Feeds the widths array and
    /// the ToUnicode CMap.
    fn unicode_glyphs(&self) -> Vec<(u16, char)> {
        let mut map: HashMap<u16, char> = HashMap::new();

        for subtable in self
            .face
            .as_face_ref()
            .tables()
            .cmap
            .expect("font has a cmap table")
            .subtables
            .into_iter()
            .filter(|table| table.is_unicode())
        {
            subtable.codepoints(|codepoint: u32| {
                if let Ok(ch) = char::try_from(codepoint) {
                    if let Some(index) = subtable.glyph_index(codepoint).filter(|index| index.0 > 0)
                    {
                        map.entry(index.0).or_insert(ch);
                    }
                }
            });
        }

        let mut glyphs: Vec<(u16, char)> = map.into_iter().collect();
        glyphs.sort_by_key(|&(gid, _)| gid);
        glyphs
    }

    /// Horizontal advance per glyph, in font units
    fn glyph_advances(&self, glyphs: &[(u16, char)]) -> Vec<(u16, u16)> {
        glyphs
            .iter()
            .filter_map(|&(gid, _)| {
                self.face
                    .as_face_ref()
                    .glyph_hor_advance(owned_ttf_parser::GlyphId(gid))
                    .map(|advance| (gid, advance))
            })
            .collect()
    }

    fn write_font_data(
        &self,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let id = refs.gen(RefType::FontData(font_index));

        writer
            .stream(id, self.face.as_slice())
            .pair(Name(b"Length1"), self.face.as_slice().len() as i32);

        id
    }

    fn write_descriptor(
        &self,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let font_data_stream_id = self.write_font_data(refs, font_index, writer);

        let glyphs = self.unicode_glyphs();
        let advances = self.glyph_advances(&glyphs);
        let max_width = advances.iter().map(|&(_, w)| w).max().unwrap_or_default();
        let sum_width: usize = advances.iter().map(|&(_, w)| w as usize).sum();
        let avg_width = sum_width as f32 / advances.len().max(1) as f32;

        let id = refs.gen(RefType::FontDescriptor(font_index));
        let scaling = 1000.0 / self.face.as_face_ref().units_per_em() as f32;

        let mut descriptor = writer.font_descriptor(id);
        descriptor.name(Name(self.name().as_bytes()));
        descriptor.family(Str(self.family().as_bytes()));
        descriptor.weight(self.face.as_face_ref().weight().to_number() as u16);

        let mut flags: FontFlags = FontFlags::empty();
        if self.face.as_face_ref().is_monospaced() {
            flags.set(FontFlags::FIXED_PITCH, true);
        }
        if self.face.as_face_ref().is_italic() {
            flags.set(FontFlags::ITALIC, true);
        }
        descriptor.flags(flags);

        let bbox = self.face.as_face_ref().global_bounding_box();
        descriptor.bbox(pdf_writer::Rect {
            x1: bbox.x_min as f32 * scaling,
            y1: bbox.y_min as f32 * scaling,
            x2: bbox.x_max as f32 * scaling,
            y2: bbox.y_max as f32 * scaling,
        });
        descriptor.italic_angle(self.face.as_face_ref().italic_angle());
        descriptor.ascent(self.face.as_face_ref().ascender() as f32 * scaling);
        descriptor.descent(self.face.as_face_ref().descender() as f32 * scaling);
        descriptor.leading(self.face.as_face_ref().line_gap() as f32 * scaling);
        descriptor.cap_height(
            self.face
                .as_face_ref()
                .capital_height()
                .map(|h| h as f32 * scaling)
                .unwrap_or(1000.0),
        );
        descriptor.x_height(
            self.face.as_face_ref().x_height().unwrap_or_default() as f32 * scaling,
        );
        // no reliable way to derive the vertical stem width from a ttf face
        descriptor.stem_v(80.0);
        descriptor.avg_width(avg_width * scaling);
        descriptor.max_width(max_width as f32 * scaling);
        descriptor.missing_width(max_width as f32 * scaling);

        descriptor.font_file2(font_data_stream_id);

        id
    }

    fn write_cid(&self, refs: &mut ObjectReferences, font_index: usize, writer: &mut Pdf) -> Ref {
        let font_descriptor_id = self.write_descriptor(refs, font_index, writer);

        let id = refs.gen(RefType::CidFont(font_index));

        let mut cid_font = writer.cid_font(id);
        cid_font.subtype(CidFontType::Type2);
        cid_font.base_font(Name(format!("F{font_index}").as_bytes()));
        cid_font.system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        });
        cid_font.font_descriptor(font_descriptor_id);

        let glyphs = self.unicode_glyphs();
        let advances = self.glyph_advances(&glyphs);
        let scaling = 1000.0 / self.face.as_face_ref().units_per_em() as f32;

        // the most common advance becomes the /DW default
        let mut advance_counts: HashMap<u16, usize> = HashMap::new();
        for &(_, advance) in advances.iter() {
            *advance_counts.entry(advance).or_insert(0) += 1;
        }
        let default_width = advance_counts
            .iter()
            .max_by_key(|&(_, count)| *count)
            .map(|(&advance, _)| advance as f32 * scaling)
            .unwrap_or(1000.0);

        let mut widths = cid_font.widths();
        widths.consecutive(0, [1000.0]);

        // group the sorted (gid, advance) pairs into runs of consecutive gids
        let mut run_start: u16 = 0;
        let mut run: Vec<f32> = Vec::new();
        for &(gid, advance) in advances.iter() {
            if !run.is_empty() && gid != run_start + run.len() as u16 {
                widths.consecutive(run_start, run.drain(..));
                run_start = gid;
            } else if run.is_empty() {
                run_start = gid;
            }
            run.push(advance as f32 * scaling);
        }
        if !run.is_empty() {
            widths.consecutive(run_start, run);
        }
        widths.finish();

        cid_font.default_width(default_width);
        cid_font.cid_to_gid_map_predefined(Name(b"Identity"));

        id
    }

    fn write_to_unicode(
        &self,
        refs: &mut ObjectReferences,
        font_index: usize,
        writer: &mut Pdf,
    ) -> Ref {
        let id = refs.gen(RefType::ToUnicode(font_index));

        let mut map: String = r#"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
"#
        .replace("\r\n", "\n");

        // bfchar blocks: at most 100 entries each, all sharing a high byte
        let glyphs = self.unicode_glyphs();
        let mut blocks: Vec<&[(u16, char)]> = Vec::new();
        let mut block_start = 0;
        for (i, &(gid, _)) in glyphs.iter().enumerate() {
            let split = i > block_start
                && ((gid >> 8) != (glyphs[block_start].0 >> 8) || i - block_start >= 100);
            if split {
                blocks.push(&glyphs[block_start..i]);
                block_start = i;
            }
        }
        if block_start < glyphs.len() {
            blocks.push(&glyphs[block_start..]);
        }

        for block in blocks.into_iter() {
            map.push_str(&format!("{} beginbfchar\n", block.len()));
            for &(gid, ch) in block.iter() {
                let ch: u32 = ch.into();
                map.push_str(&format!("<{gid:04x}> <{ch:04x}>\n"));
            }
            map.push_str("endbfchar\n");
        }

        map.push_str("endcmap CMapName currentdict /CMap defineresource pop end end\n");

        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(
            map.as_bytes(),
            miniz_oxide::deflate::CompressionLevel::DefaultLevel as u8,
        );
        let mut stream = writer.stream(id, compressed.as_slice());
        stream.filter(pdf_writer::Filter::FlateDecode);

        id
    }

    pub(crate) fn write(&self, refs: &mut ObjectReferences, id: Id<Font>, writer: &mut Pdf) {
        let font_index = id.index();
        let font_id = refs.gen(RefType::Font(font_index));
        let cid_font_id = self.write_cid(refs, font_index, writer);
        let to_unicode_id = self.write_to_unicode(refs, font_index, writer);

        let mut font = writer.type0_font(font_id);
        font.base_font(Name(format!("F{font_index}").as_bytes()));
        font.encoding_predefined(Name(b"Identity-H"));
        font.descendant_font(cid_font_id);
        font.to_unicode(to_unicode_id);
    }
}
