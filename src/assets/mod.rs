//! Static asset resolution.
//!
//! # Data Flow
//! ```text
//! request URI path
//!     → resolve(): on-disk file under root, extension not the entry
//!       script's → Asset (content + MIME + exact length, connection close)
//!     → otherwise → Dynamic (ScriptBinding for the single entry script)
//! ```
//!
//! # Design Decisions
//! - The root path `/` is always dynamic
//! - Executable scripts under the web root are never served as files; every
//!   dynamic request funnels through the one configured entry script
//! - A read fault after the existence check (filesystem race) demotes the
//!   match to dynamic instead of failing the request
//! - `..` segments never resolve to an asset

use std::path::Path;

use crate::http::ScriptBinding;

/// A file ready to be emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedFile {
    pub mime: String,
    pub content: Vec<u8>,
}

impl ServedFile {
    /// Exact byte length of the content, as sent in `Content-Length`.
    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Outcome of static resolution for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Serve this file directly; the dispatcher is never invoked.
    Asset(ServedFile),
    /// Run the request through the entry script.
    Dynamic(ScriptBinding),
}

/// Decide whether a URI maps to an on-disk, non-executable file.
pub fn resolve(uri_path: &str, root: &Path, index_file: &str) -> Resolution {
    let dynamic = || Resolution::Dynamic(ScriptBinding::entry(root, index_file));

    if uri_path == "/" {
        return dynamic();
    }
    if uri_path.split('/').any(|segment| segment == "..") {
        return dynamic();
    }

    let candidate = root.join(uri_path.trim_start_matches('/'));
    if !candidate.is_file() {
        return dynamic();
    }

    let script_extension = Path::new(index_file).extension().and_then(|e| e.to_str());
    let extension = candidate.extension().and_then(|e| e.to_str());
    if script_extension.is_some() && extension == script_extension {
        return dynamic();
    }

    match std::fs::read(&candidate) {
        Ok(content) => Resolution::Asset(ServedFile {
            mime: mime_guess::from_path(&candidate)
                .first_or_octet_stream()
                .to_string(),
            content,
        }),
        Err(e) => {
            // Lost the race between the existence check and the read.
            tracing::debug!(path = %candidate.display(), error = %e, "Static read failed, falling through to dynamic dispatch");
            dynamic()
        }
    }
}
