use thiserror::Error;

use crate::texture::PageTexture;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtlasError {
    #[error("atlas has no pages")]
    Empty,
    #[error("line {line}: `{key}` expects {expected} values, got {got}")]
    MissingValues {
        line: usize,
        key: String,
        expected: usize,
        got: usize,
    },
    #[error("line {line}: `{key}` has invalid number `{value}`")]
    InvalidNumber {
        line: usize,
        key: String,
        value: String,
    },
}

#[derive(Debug, Clone)]
pub struct AtlasPage {
    /// Image file name exactly as written in the atlas.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pma: bool,
    pub texture: Option<PageTexture>,
}

impl AtlasPage {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: 0,
            height: 0,
            pma: false,
            texture: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtlasRegion {
    pub name: String,
    pub page: usize,
    pub x: u32,
    pub y: u32,
    /// Unrotated size of the packed pixels.
    pub width: u32,
    pub height: u32,
    pub original_width: u32,
    pub original_height: u32,
    pub offset_x: f32,
    pub offset_y: f32,
    /// 0 or 90.
    pub degrees: i32,
    pub index: i32,
    pub u: f32,
    pub v: f32,
    pub u2: f32,
    pub v2: f32,
}

impl AtlasRegion {
    fn new(name: &str, page: usize) -> Self {
        Self {
            name: name.to_string(),
            page,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            original_width: 0,
            original_height: 0,
            offset_x: 0.0,
            offset_y: 0.0,
            degrees: 0,
            index: -1,
            u: 0.0,
            v: 0.0,
            u2: 0.0,
            v2: 0.0,
        }
    }

    fn compute_uvs(&mut self, page_width: u32, page_height: u32) {
        let pw = page_width.max(1) as f32;
        let ph = page_height.max(1) as f32;
        self.u = self.x as f32 / pw;
        self.v = self.y as f32 / ph;
        if self.degrees == 90 {
            self.u2 = (self.x + self.height) as f32 / pw;
            self.v2 = (self.y + self.width) as f32 / ph;
        } else {
            self.u2 = (self.x + self.width) as f32 / pw;
            self.v2 = (self.y + self.height) as f32 / ph;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextureAtlas {
    pub pages: Vec<AtlasPage>,
    pub regions: Vec<AtlasRegion>,
}

/// `key: a, b, c` split into its parts.
struct Entry<'a> {
    line: usize,
    key: &'a str,
    values: Vec<&'a str>,
}

impl<'a> Entry<'a> {
    fn parse(line: usize, text: &'a str) -> Option<Self> {
        let text = text.trim();
        let (key, rest) = text.split_once(':')?;
        Some(Self {
            line,
            key: key.trim(),
            values: rest.split(',').map(str::trim).collect(),
        })
    }

    fn numbers<const N: usize>(&self) -> Result<[f32; N], AtlasError> {
        if self.values.len() < N {
            return Err(AtlasError::MissingValues {
                line: self.line,
                key: self.key.to_string(),
                expected: N,
                got: self.values.len(),
            });
        }
        let mut out = [0.0; N];
        for (slot, value) in out.iter_mut().zip(&self.values) {
            *slot = value.parse().map_err(|_| AtlasError::InvalidNumber {
                line: self.line,
                key: self.key.to_string(),
                value: value.to_string(),
            })?;
        }
        Ok(out)
    }

    fn unsigned<const N: usize>(&self) -> Result<[u32; N], AtlasError> {
        Ok(self.numbers::<N>()?.map(|v| v.max(0.0) as u32))
    }
}

impl TextureAtlas {
    pub fn parse(text: &str) -> Result<Self, AtlasError> {
        let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l)).peekable();
        let mut atlas = TextureAtlas::default();

        // Leading blank lines and the optional header block.
        while lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}
        while lines
            .next_if(|(n, l)| Entry::parse(*n, l).is_some())
            .is_some()
        {}

        let mut page: Option<usize> = None;
        while let Some((line_no, line)) = lines.next() {
            if line.trim().is_empty() {
                page = None;
                continue;
            }

            match page {
                None => {
                    let mut current = AtlasPage::new(line.trim());
                    while let Some((n, l)) = lines.next_if(|(n, l)| Entry::parse(*n, l).is_some()) {
                        if let Some(entry) = Entry::parse(n, l) {
                            apply_page_entry(&mut current, &entry)?;
                        }
                    }
                    atlas.pages.push(current);
                    page = Some(atlas.pages.len() - 1);
                }
                Some(page_index) => {
                    let mut region = AtlasRegion::new(line.trim(), page_index);
                    let mut has_orig = false;
                    while let Some((n, l)) = lines.next_if(|(n, l)| Entry::parse(*n, l).is_some()) {
                        if let Some(entry) = Entry::parse(n, l) {
                            has_orig |= apply_region_entry(&mut region, &entry)?;
                        }
                    }
                    if !has_orig {
                        region.original_width = region.width;
                        region.original_height = region.height;
                    }
                    let p = &atlas.pages[page_index];
                    region.compute_uvs(p.width, p.height);
                    log::trace!("atlas line {line_no}: region {}", region.name);
                    atlas.regions.push(region);
                }
            }
        }

        if atlas.pages.is_empty() {
            return Err(AtlasError::Empty);
        }
        Ok(atlas)
    }

    pub fn find_region(&self, name: &str) -> Option<&AtlasRegion> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn page(&self, index: usize) -> Option<&AtlasPage> {
        self.pages.get(index)
    }

    /// Attach a texture to every page; pages the loader cannot serve stay unbound.
    pub fn bind_pages(&mut self, mut loader: impl FnMut(&AtlasPage) -> Option<PageTexture>) {
        for page in &mut self.pages {
            page.texture = loader(page);
        }
        // Pages without a declared size take it from their image.
        for index in 0..self.pages.len() {
            let page = &mut self.pages[index];
            if page.width == 0 || page.height == 0 {
                if let Some(texture) = &page.texture {
                    page.width = texture.width;
                    page.height = texture.height;
                    let (w, h) = (page.width, page.height);
                    for region in self.regions.iter_mut().filter(|r| r.page == index) {
                        region.compute_uvs(w, h);
                    }
                }
            }
        }
    }
}

fn apply_page_entry(page: &mut AtlasPage, entry: &Entry) -> Result<(), AtlasError> {
    match entry.key {
        "size" => {
            let [w, h] = entry.unsigned::<2>()?;
            page.width = w;
            page.height = h;
        }
        "pma" => page.pma = entry.values.first() == Some(&"true"),
        // format, filter and repeat only matter to a GPU sampler
        _ => {}
    }
    Ok(())
}

/// Returns true when the entry set the original size.
fn apply_region_entry(region: &mut AtlasRegion, entry: &Entry) -> Result<bool, AtlasError> {
    match entry.key {
        "xy" => {
            let [x, y] = entry.unsigned::<2>()?;
            region.x = x;
            region.y = y;
        }
        "size" => {
            let [w, h] = entry.unsigned::<2>()?;
            region.width = w;
            region.height = h;
        }
        "bounds" => {
            let [x, y, w, h] = entry.unsigned::<4>()?;
            region.x = x;
            region.y = y;
            region.width = w;
            region.height = h;
        }
        "offset" => {
            let [x, y] = entry.numbers::<2>()?;
            region.offset_x = x;
            region.offset_y = y;
        }
        "orig" => {
            let [w, h] = entry.unsigned::<2>()?;
            region.original_width = w;
            region.original_height = h;
            return Ok(true);
        }
        "offsets" => {
            let [x, y, w, h] = entry.numbers::<4>()?;
            region.offset_x = x;
            region.offset_y = y;
            region.original_width = w.max(0.0) as u32;
            region.original_height = h.max(0.0) as u32;
            return Ok(true);
        }
        "rotate" => {
            region.degrees = match entry.values.first().copied() {
                Some("true") => 90,
                Some("false") | None => 0,
                Some(_) => entry.numbers::<1>()?[0] as i32,
            };
        }
        "index" => region.index = entry.numbers::<1>()?[0] as i32,
        _ => {}
    }
    Ok(false)
}
