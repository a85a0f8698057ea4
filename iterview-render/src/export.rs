//! PNG export with embedded metadata (tEXt chunks).

use std::io::BufWriter;
use std::path::Path;

use tracing::debug;

use crate::present::Frame;
use crate::session::RenderSession;

/// Metadata to embed in an exported PNG as tEXt chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportMetadata {
    pub function: String,
    pub space: String,
    pub rect: String,
    pub colormap: String,
    /// `name=value` pairs of the function's arguments.
    pub args: Vec<(String, String)>,
    pub elapsed_ms: u64,
}

impl ExportMetadata {
    pub fn from_session(session: &RenderSession) -> Self {
        Self {
            function: session.function_name.clone(),
            space: session.space.to_string(),
            rect: session.viewport.rect.to_string(),
            colormap: session.colormap.name().to_string(),
            args: session
                .args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            elapsed_ms: session.elapsed.as_millis() as u64,
        }
    }
}

/// Write `frame` as an RGBA PNG with the metadata as tEXt chunks.
pub fn export_png(frame: &Frame, path: &Path, metadata: &ExportMetadata) -> crate::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    encoder.add_text_chunk("Software".to_string(), "iterview".to_string())?;
    encoder.add_text_chunk("Description".to_string(), build_description(metadata))?;
    for (key, value) in build_metadata_pairs(metadata, frame) {
        encoder.add_text_chunk(key, value)?;
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&frame.to_rgba8())?;

    debug!(
        width = frame.width,
        height = frame.height,
        "Exported PNG to {}",
        path.display()
    );
    Ok(())
}

fn build_description(meta: &ExportMetadata) -> String {
    let mut desc = format!("{} ({} space) over {}", meta.function, meta.space, meta.rect);
    if !meta.args.is_empty() {
        let args: Vec<String> = meta.args.iter().map(|(k, v)| format!("{k}={v}")).collect();
        desc.push_str(&format!(", {}", args.join(" ")));
    }
    desc
}

fn build_metadata_pairs(meta: &ExportMetadata, frame: &Frame) -> Vec<(String, String)> {
    let mut pairs = vec![
        ("iterview.Function".into(), meta.function.clone()),
        ("iterview.Space".into(), meta.space.clone()),
        ("iterview.Rect".into(), meta.rect.clone()),
        ("iterview.Colormap".into(), meta.colormap.clone()),
        ("iterview.ElapsedMs".into(), meta.elapsed_ms.to_string()),
        (
            "iterview.Resolution".into(),
            format!("{}x{}", frame.width, frame.height),
        ),
    ];
    for (name, value) in &meta.args {
        pairs.push((format!("iterview.Arg.{name}"), value.clone()));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn metadata() -> ExportMetadata {
        ExportMetadata {
            function: "mandi".into(),
            space: "dynamical".into(),
            rect: "-2,2,-2,2".into(),
            colormap: "fire".into(),
            args: vec![("C".into(), "-1,0".into()), ("depth".into(), "150".into())],
            elapsed_ms: 12,
        }
    }

    #[test]
    fn export_creates_valid_png() {
        let frame = Frame::new(4, 4);
        let dir = std::env::temp_dir().join("iterview_test_export");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_export.png");
        export_png(&frame, &path, &metadata()).expect("export should succeed");

        let mut file = std::fs::File::open(&path).expect("file should exist");
        let mut header = [0u8; 8];
        file.read_exact(&mut header).expect("should read header");
        assert_eq!(&header, b"\x89PNG\r\n\x1a\n", "valid PNG signature");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn export_embeds_text_chunks_and_pixels() {
        let mut frame = Frame::new(2, 2);
        frame.pixels[1] = 0xFF11_2233;
        let dir = std::env::temp_dir().join("iterview_test_export_meta");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("test_meta.png");
        export_png(&frame, &path, &metadata()).expect("export should succeed");

        let decoder = png::Decoder::new(std::fs::File::open(&path).expect("file should exist"));
        let mut reader = decoder.read_info().expect("should read info");
        {
            let texts = &reader.info().uncompressed_latin1_text;
            assert!(texts
                .iter()
                .any(|t| t.keyword == "Software" && t.text == "iterview"));
            assert!(texts
                .iter()
                .any(|t| t.keyword == "iterview.Space" && t.text == "dynamical"));
            assert!(texts
                .iter()
                .any(|t| t.keyword == "iterview.Arg.C" && t.text == "-1,0"));
            assert!(texts
                .iter()
                .any(|t| t.keyword == "iterview.Resolution" && t.text == "2x2"));
        }

        let mut buf = vec![0u8; reader.output_buffer_size()];
        reader.next_frame(&mut buf).expect("should decode");
        assert_eq!(&buf[4..8], &[0x11, 0x22, 0x33, 0xFF]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn description_lists_args() {
        let desc = build_description(&metadata());
        assert_eq!(desc, "mandi (dynamical space) over -2,2,-2,2, C=-1,0 depth=150");
    }
}
