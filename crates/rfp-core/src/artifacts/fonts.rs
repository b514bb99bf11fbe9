//! Font resolution for the PDF/DOCX builders: try a platform search path,
//! then fall back to a bundled face. Never touches the network.

use crate::error::ArtifactError;

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/liberation2/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const SYSTEM_BOLD_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Built-in faces shipped alongside the binary, tried once no platform
/// font is found.
const BUNDLED_FONT_CANDIDATES: &[&str] = &["assets/fonts/DejaVuSans.ttf", "assets/fonts/LiberationSans-Regular.ttf"];
const BUNDLED_BOLD_FONT_CANDIDATES: &[&str] = &["assets/fonts/DejaVuSans-Bold.ttf", "assets/fonts/LiberationSans-Bold.ttf"];

fn first_readable(candidates: &[&str]) -> Option<Vec<u8>> {
    candidates.iter().find_map(|path| std::fs::read(path).ok())
}

/// Resolve the regular body face.
pub fn resolve_body_font() -> Result<Vec<u8>, ArtifactError> {
    first_readable(SYSTEM_FONT_CANDIDATES)
        .or_else(|| first_readable(BUNDLED_FONT_CANDIDATES))
        .ok_or(ArtifactError::FontUnavailable)
}

/// Resolve the bold face used for headings.
pub fn resolve_bold_font() -> Result<Vec<u8>, ArtifactError> {
    first_readable(SYSTEM_BOLD_FONT_CANDIDATES)
        .or_else(|| first_readable(BUNDLED_BOLD_FONT_CANDIDATES))
        .ok_or(ArtifactError::FontUnavailable)
}
