//! OCR fallback for PDF pages whose native text extraction is too thin,
//! backed by `ocrs`/`rten` (enabled only under the `ocr` feature).

use once_cell::sync::OnceCell;
use ocrs::{OcrEngine, OcrEngineParams};
use rten::Model;

static ENGINE: OnceCell<OcrEngine> = OnceCell::new();

/// Lazily construct the shared OCR engine from the bundled detection and
/// recognition models.
fn engine() -> Result<&'static OcrEngine, String> {
    ENGINE.get_or_try_init(|| {
        let detection_model = Model::load_file("models/text-detection.rten").map_err(|e| e.to_string())?;
        let recognition_model = Model::load_file("models/text-recognition.rten").map_err(|e| e.to_string())?;

        OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|e| e.to_string())
    })
}

/// Recognize text in a rendered page image.
pub fn recognize_text(image: &image::DynamicImage) -> Result<String, String> {
    let engine = engine()?;
    let rgb = image.to_rgb8();
    let input = engine
        .prepare_input(rten_imageproc::Image::from_rgb(rgb.as_raw(), rgb.width() as usize, rgb.height() as usize))
        .map_err(|e| e.to_string())?;
    let words = engine.detect_words(&input).map_err(|e| e.to_string())?;
    let lines = engine.find_text_lines(&input, &words);
    let text_lines = engine.recognize_text(&input, &lines).map_err(|e| e.to_string())?;

    Ok(text_lines
        .into_iter()
        .flatten()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}
