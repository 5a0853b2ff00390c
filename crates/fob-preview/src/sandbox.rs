//! Sandbox document assembly.
//!
//! The assembled document is meant to be loaded into an isolated frame. It
//! owns its mount element and its error handling: build output and render
//! failures both end up in the same in-document error panel.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::PreviewConfig;
use crate::engine::BundleResult;

static SCRIPT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(script)").expect("script close pattern is valid"));

static STYLE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(style)").expect("style close pattern is valid"));

/// Name of the harness function that renders the error panel.
pub const SHOW_ERROR_FN: &str = "__fobPreviewShowError";

const PANEL_CSS: &str = r#"html, body { margin: 0; padding: 0; }
.fob-preview-error {
  margin: 0;
  padding: 16px;
  min-height: 100vh;
  box-sizing: border-box;
  background: #1e1e1e;
  color: #ff6b6b;
  font: 13px/1.5 ui-monospace, SFMono-Regular, Menlo, Consolas, monospace;
  white-space: pre-wrap;
  word-break: break-word;
}"#;

const HARNESS_JS: &str = r#"(function () {
  var mountId = "__MOUNT_ID__";
  function escapeHtml(value) {
    return String(value).replace(/[&<>"']/g, function (c) {
      return { "&": "&amp;", "<": "&lt;", ">": "&gt;", '"': "&quot;", "'": "&#x27;" }[c];
    });
  }
  function describe(error, fallback) {
    if (error && error.stack) return String(error.stack);
    if (error && error.message) return String(error.message);
    return error === undefined ? String(fallback) : String(error);
  }
  window.__SHOW_ERROR__ = function (message) {
    var mount = document.getElementById(mountId) || document.body;
    mount.innerHTML = '<pre class="fob-preview-error">' + escapeHtml(message) + "</pre>";
  };
  window.addEventListener("error", function (event) {
    window.__SHOW_ERROR__(describe(event.error, event.message));
  });
  window.addEventListener("unhandledrejection", function (event) {
    window.__SHOW_ERROR__(describe(event.reason, "Unhandled promise rejection"));
  });
})();"#;

const BOOTSTRAP_JS: &str = r#"(function () {
  try {
    var Component = globalThis.__GLOBAL_SLOT__;
    if (!Component) {
      throw new Error("Preview entry did not register a component on globalThis.__GLOBAL_SLOT__");
    }
    var root = ReactDOM.createRoot(document.getElementById("__MOUNT_ID__"));
    root.render(React.createElement(Component));
  } catch (error) {
    window.__SHOW_ERROR__(error && error.stack ? String(error.stack) : String(error));
  }
})();"#;

/// A complete, self-contained HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxDocument {
    html: String,
}

impl SandboxDocument {
    pub fn as_str(&self) -> &str {
        &self.html
    }

    pub fn into_string(self) -> String {
        self.html
    }

    pub fn len(&self) -> usize {
        self.html.len()
    }

    pub fn is_empty(&self) -> bool {
        self.html.is_empty()
    }
}

impl fmt::Display for SandboxDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}

impl AsRef<str> for SandboxDocument {
    fn as_ref(&self) -> &str {
        &self.html
    }
}

/// Builds sandbox documents for one configuration.
///
/// The assembler does not look at the bundle beyond making it safe to
/// inline; a broken bundle shows up at run time in the error panel.
#[derive(Debug, Clone)]
pub struct SandboxAssembler {
    config: PreviewConfig,
}

impl SandboxAssembler {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Embed `bundle` in a runnable document.
    pub fn assemble(&self, bundle: &BundleResult) -> SandboxDocument {
        let mut head_styles = String::new();
        for stylesheet in &bundle.stylesheets {
            head_styles.push_str("<style>\n");
            head_styles.push_str(&escape_style_content(stylesheet));
            head_styles.push_str("\n</style>\n");
        }

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Preview</title>
<style>
{panel_css}
</style>
{head_styles}<script crossorigin src="{react_url}"></script>
<script crossorigin src="{react_dom_url}"></script>
</head>
<body>
<div id="{mount_id}"></div>
<script>
{harness}
</script>
<script>
{bundle}
</script>
<script>
{bootstrap}
</script>
</body>
</html>
"#,
            panel_css = PANEL_CSS,
            head_styles = head_styles,
            react_url = html_escape(&self.config.react_url),
            react_dom_url = html_escape(&self.config.react_dom_url),
            mount_id = self.config.mount_id,
            harness = self.fill(HARNESS_JS),
            bundle = escape_script_content(&bundle.code),
            bootstrap = self.fill(BOOTSTRAP_JS),
        );

        SandboxDocument { html }
    }

    /// A static document showing a build-time error in the panel style.
    ///
    /// Contains no script; the message is escaped here.
    pub fn error_document(&self, message: &str) -> SandboxDocument {
        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<title>Preview build failed</title>
<style>
{panel_css}
</style>
</head>
<body>
<div id="{mount_id}"><pre class="fob-preview-error">{message}</pre></div>
</body>
</html>
"#,
            panel_css = PANEL_CSS,
            mount_id = self.config.mount_id,
            message = html_escape(message),
        );

        SandboxDocument { html }
    }

    fn fill(&self, template: &str) -> String {
        template
            .replace("__SHOW_ERROR__", SHOW_ERROR_FN)
            .replace("__MOUNT_ID__", &self.config.mount_id)
            .replace("__GLOBAL_SLOT__", &self.config.global_slot)
    }
}

impl Default for SandboxAssembler {
    fn default() -> Self {
        Self::new(PreviewConfig::default())
    }
}

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rewrite `</script` (any case) to `<\/script` so inlined code cannot end
/// its own script element.
pub fn escape_script_content(code: &str) -> String {
    SCRIPT_CLOSE.replace_all(code, r"<\/$1").into_owned()
}

fn escape_style_content(css: &str) -> String {
    STYLE_CLOSE.replace_all(css, r"<\/$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(code: &str) -> String {
        SandboxAssembler::default()
            .assemble(&BundleResult::new(code))
            .into_string()
    }

    #[test]
    fn test_sections_are_in_order() {
        let html = assemble("console.log('bundle');");
        let react = html.find("react@18.3.1/umd/react.development.js").unwrap();
        let react_dom = html.find("react-dom@18.3.1/umd/react-dom.development.js").unwrap();
        let harness = html.find("addEventListener(\"error\"").unwrap();
        let bundle = html.find("console.log('bundle');").unwrap();
        let bootstrap = html.find("createRoot").unwrap();

        assert!(react < react_dom);
        assert!(react_dom < harness);
        assert!(harness < bundle);
        assert!(bundle < bootstrap);
    }

    #[test]
    fn test_document_structure() {
        let html = assemble("1;");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<div id="root"></div>"#));
        assert!(html.contains("globalThis.__FOB_PREVIEW_COMPONENT__"));
        assert!(html.contains("window.__fobPreviewShowError = function"));
        assert!(html.contains("unhandledrejection"));
        assert!(html.contains("} catch (error) {"));
        assert!(!html.contains("__SHOW_ERROR__"));
        assert!(!html.contains("__MOUNT_ID__"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_bundle_is_inlined_verbatim() {
        let code = "var a = 1 < 2 && \"x\";\nconsole.log(a);";
        assert!(assemble(code).contains(code));
    }

    #[test]
    fn test_script_close_is_escaped() {
        let html = assemble(r#"const s = "</script><script>alert(1)</SCRIPT>";"#);
        assert!(html.contains(r#"const s = "<\/script><script>alert(1)<\/SCRIPT>";"#));
        // Two host scripts, harness, bundle, bootstrap.
        assert_eq!(html.matches("</script>").count(), 5);
    }

    #[test]
    fn test_stylesheets_are_inlined_in_head() {
        let bundle = BundleResult {
            code: "1;".into(),
            stylesheets: vec![".card { color: red; }".into()],
        };
        let html = SandboxAssembler::default().assemble(&bundle).into_string();
        let style = html.find(".card { color: red; }").unwrap();
        assert!(style < html.find("</head>").unwrap());
    }

    #[test]
    fn test_custom_mount_and_slot() {
        let config = PreviewConfig {
            mount_id: "app".into(),
            global_slot: "Preview".into(),
            ..PreviewConfig::default()
        };
        let html = SandboxAssembler::new(config)
            .assemble(&BundleResult::new("1;"))
            .into_string();
        assert!(html.contains(r#"<div id="app"></div>"#));
        assert!(html.contains(r#"document.getElementById("app")"#));
        assert!(html.contains("globalThis.Preview;"));
    }

    #[test]
    fn test_error_document_escapes_message() {
        let doc = SandboxAssembler::default()
            .error_document("app/page.tsx imports disallowed module: \"<left-pad>\" & more");
        let html = doc.as_str();
        assert!(html.contains("&quot;&lt;left-pad&gt;&quot; &amp; more"));
        assert!(!html.contains("<left-pad>"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"Error in <Component attr="value" & 'test'>"#),
            "Error in &lt;Component attr=&quot;value&quot; &amp; &#x27;test&#x27;&gt;"
        );
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn test_document_accessors() {
        let doc = SandboxAssembler::default().assemble(&BundleResult::new("1;"));
        assert_eq!(doc.len(), doc.as_str().len());
        assert_eq!(doc.to_string(), doc.as_str());
        assert!(!doc.is_empty());
    }
}
