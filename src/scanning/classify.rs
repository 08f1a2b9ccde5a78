//! Extension-based file classification
//!
//! Maps the extension of a URL path (or a bare extension) onto the closed
//! [`Category`] set. Classification is total: anything unparseable or
//! unknown degrades to [`Category::Other`].

use url::Url;

use crate::types::Category;

/// Classify a URL or a bare extension such as `pdf` or `.PNG`
pub fn classify(input: &str) -> Category {
    let input = input.trim();

    if let Ok(url) = Url::parse(input) {
        // mailto:, data: and similar carry no file path
        if url.cannot_be_a_base() {
            return Category::Other;
        }
        return classify_url(&url);
    }

    match bare_extension(input) {
        Some(ext) => classify_extension(ext),
        None => Category::Other,
    }
}

/// Classify a parsed URL by the extension of its last path segment
pub fn classify_url(url: &Url) -> Category {
    extension_of_path(url.path())
        .map(|ext| classify_extension(&ext))
        .unwrap_or(Category::Other)
}

/// Look up an extension (without the leading dot) in the static table
pub fn classify_extension(ext: &str) -> Category {
    category_for_extension(&ext.to_ascii_lowercase()).unwrap_or(Category::Other)
}

/// Lowercased extension of the last segment of a URL path.
///
/// Returns `None` when the last segment has no dot or ends with one.
pub fn extension_of_path(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or_default();
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Extension of a URL, lowercased, if its last path segment carries one
pub fn extension_of_url(url: &Url) -> Option<String> {
    extension_of_path(url.path())
}

/// Accept `pdf`, `.pdf`, `tar.gz` style inputs; reject anything path-like
fn bare_extension(input: &str) -> Option<&str> {
    let ext = input.rsplit('.').next()?;
    let looks_bare = !input.contains('/')
        && !ext.is_empty()
        && ext.len() <= 10
        && ext.chars().all(|c| c.is_ascii_alphanumeric());
    looks_bare.then_some(ext)
}

fn category_for_extension(ext: &str) -> Option<Category> {
    let category = match ext {
        // Images
        "jpg" | "jpeg" | "jpe" | "jfif" | "png" | "apng" | "gif" | "svg" | "svgz" | "webp"
        | "bmp" | "ico" | "cur" | "tif" | "tiff" | "avif" | "heic" | "heif" | "jxl" | "psd"
        | "raw" | "cr2" | "nef" | "arw" | "dng" | "xcf" | "ai" | "eps" => Category::Image,

        // Video
        "mp4" | "m4v" | "webm" | "avi" | "mov" | "mkv" | "flv" | "wmv" | "mpg" | "mpeg"
        | "3gp" | "3g2" | "ogv" | "m2ts" | "mts" | "vob" | "f4v" | "asf" => Category::Video,

        // Audio
        "mp3" | "wav" | "ogg" | "oga" | "opus" | "m4a" | "flac" | "aac" | "wma" | "aif"
        | "aiff" | "mid" | "midi" | "amr" | "ape" | "alac" | "weba" => Category::Audio,

        // Documents
        "pdf" | "doc" | "docx" | "odt" | "rtf" | "txt" | "md" | "markdown" | "tex" | "epub"
        | "mobi" | "azw3" | "djvu" | "xps" | "pages" | "xls" | "xlsx" | "ods" | "numbers"
        | "ppt" | "pptx" | "odp" | "key" => Category::Document,

        // Archives and disk images
        "zip" | "rar" | "7z" | "tar" | "gz" | "tgz" | "bz2" | "tbz2" | "xz" | "txz" | "zst"
        | "lz" | "lzma" | "z" | "cab" | "iso" | "img" | "jar" | "war" => Category::Archive,

        // Fonts
        "ttf" | "otf" | "woff" | "woff2" | "eot" | "fon" | "pfb" | "pfm" => Category::Font,

        // Stylesheets
        "css" | "scss" | "sass" | "less" | "styl" => Category::Style,

        // Scripts
        "js" | "mjs" | "cjs" | "jsx" | "ts" | "tsx" | "sh" | "bash" | "zsh" | "fish" | "ps1"
        | "bat" | "cmd" | "vbs" | "wasm" => Category::Script,

        // Source code
        "py" | "pyw" | "ipynb" | "rb" | "php" | "pl" | "lua" | "r" | "java" | "kt" | "kts"
        | "scala" | "groovy" | "c" | "h" | "cpp" | "cc" | "cxx" | "hpp" | "hh" | "cs" | "fs"
        | "go" | "rs" | "swift" | "m" | "mm" | "dart" | "zig" | "nim" | "hs" | "ml" | "ex"
        | "exs" | "erl" | "clj" | "elm" | "vue" | "svelte" | "sql" | "asm" | "s" => Category::Code,

        // 3D models
        "obj" | "fbx" | "stl" | "gltf" | "glb" | "dae" | "3ds" | "blend" | "ply" | "usdz"
        | "usd" | "x3d" | "step" | "stp" | "iges" => Category::Model3D,

        // Structured data
        "json" | "jsonl" | "ndjson" | "xml" | "csv" | "tsv" | "yaml" | "yml" | "toml" | "ini"
        | "sqlite" | "db" | "parquet" | "avro" | "geojson" | "kml" | "gpx" | "rss" | "atom" => {
            Category::Data
        }

        // Executables and installers
        "exe" | "msi" | "dmg" | "pkg" | "app" | "apk" | "aab" | "ipa" | "deb" | "rpm"
        | "appimage" | "flatpak" | "snap" | "bin" | "run" | "dll" | "so" | "dylib" | "com" => {
            Category::Executable
        }

        _ => return None,
    };
    Some(category)
}
