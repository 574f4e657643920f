use std::path::Path;

/// Classification tag stored on every post, derived from the uploaded
/// file's extension at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Text,
    Image,
    Video,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Text => "text",
            PostKind::Image => "image",
            PostKind::Video => "video",
        }
    }
}

/// Derive a post's kind from its media filename. Unknown extensions
/// fall back to `text` even when a file was attached.
pub fn classify(media: Option<&str>) -> PostKind {
    let Some(name) = media.filter(|m| !m.is_empty()) else {
        return PostKind::Text;
    };
    match name.rsplit('.').next() {
        Some("png") | Some("jpg") | Some("jpeg") | Some("svg") => PostKind::Image,
        Some("mp4") | Some("mov") => PostKind::Video,
        _ => PostKind::Text,
    }
}

/// Strip any directory components from an uploaded filename. Post media
/// keeps its original basename, so two uploads with the same name
/// overwrite each other.
pub fn original_basename(filename: &str) -> Option<String> {
    Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
}

/// Sanitize a filename for profile images: basename only, ASCII
/// alphanumerics plus `.`, `-`, `_`, no leading dots.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = original_basename(filename)?;
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Persist an upload under the uploads directory. An existing file with
/// the same name is overwritten.
pub fn save_upload(uploads_dir: &Path, filename: &str, data: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(uploads_dir)?;
    std::fs::write(uploads_dir.join(filename), data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_extensions_classify_as_image() {
        for name in ["photo.png", "pic.jpg", "pic.jpeg", "logo.svg"] {
            assert_eq!(classify(Some(name)), PostKind::Image, "{}", name);
        }
    }

    #[test]
    fn video_extensions_classify_as_video() {
        assert_eq!(classify(Some("clip.mp4")), PostKind::Video);
        assert_eq!(classify(Some("clip.mov")), PostKind::Video);
    }

    #[test]
    fn unknown_or_missing_media_classifies_as_text() {
        assert_eq!(classify(None), PostKind::Text);
        assert_eq!(classify(Some("")), PostKind::Text);
        assert_eq!(classify(Some("doc.pdf")), PostKind::Text);
        assert_eq!(classify(Some("noextension")), PostKind::Text);
    }

    #[test]
    fn uppercase_extensions_are_not_matched() {
        // Extension matching is exact, like the filename check it models.
        assert_eq!(classify(Some("PHOTO.PNG")), PostKind::Text);
    }

    #[test]
    fn original_basename_strips_directories() {
        assert_eq!(
            original_basename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(original_basename("photo.png").as_deref(), Some("photo.png"));
        assert_eq!(original_basename(""), None);
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(
            sanitize_filename("my photo (1).png").as_deref(),
            Some("my_photo__1_.png")
        );
        assert_eq!(sanitize_filename("...hidden").as_deref(), Some("hidden"));
        assert_eq!(sanitize_filename("a/b/c.png").as_deref(), Some("c.png"));
        assert_eq!(sanitize_filename("..."), None);
    }

    #[test]
    fn save_upload_overwrites_existing_file() {
        let tmp = tempfile::tempdir().unwrap();
        save_upload(tmp.path(), "a.png", b"one").unwrap();
        save_upload(tmp.path(), "a.png", b"two").unwrap();
        assert_eq!(std::fs::read(tmp.path().join("a.png")).unwrap(), b"two");
    }
}
