#[derive(Debug, Clone, PartialEq)]
pub enum TextureStatus {
    Resolved,
    Missing,
    Failed(String),
}

/// One row per atlas page.
#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub page_id: usize,
    pub page_name: String,
    pub status: TextureStatus,
    /// Bundle file the page name resolved to.
    pub file: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl TextureInfo {
    pub fn new(page_id: usize, page_name: String) -> Self {
        Self {
            page_id,
            page_name,
            status: TextureStatus::Missing,
            file: None,
            width: 0,
            height: 0,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.status, TextureStatus::Resolved)
    }

    pub fn has_error(&self) -> bool {
        matches!(self.status, TextureStatus::Failed(_))
    }

    pub fn status_text(&self) -> String {
        match &self.status {
            TextureStatus::Resolved => format!(
                "{} ({}x{})",
                self.file.as_deref().unwrap_or(&self.page_name),
                self.width,
                self.height
            ),
            TextureStatus::Missing => "No matching image dropped".to_string(),
            TextureStatus::Failed(err) => format!("Decode error: {}", err),
        }
    }

    pub fn status_color(&self) -> egui::Color32 {
        match &self.status {
            TextureStatus::Resolved => egui::Color32::GREEN,
            TextureStatus::Missing => egui::Color32::YELLOW,
            TextureStatus::Failed(_) => egui::Color32::RED,
        }
    }
}

#[derive(Debug, Default)]
pub struct TextureManager {
    pub textures: Vec<TextureInfo>,
}

impl TextureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }

    pub fn push(&mut self, info: TextureInfo) {
        self.textures.push(info);
    }

    pub fn get_texture(&self, id: usize) -> Option<&TextureInfo> {
        self.textures.get(id)
    }

    pub fn resolved_count(&self) -> usize {
        self.textures.iter().filter(|t| t.is_resolved()).count()
    }

    pub fn missing_count(&self) -> usize {
        self.textures
            .iter()
            .filter(|t| t.status == TextureStatus::Missing)
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.textures.iter().filter(|t| t.has_error()).count()
    }
}
