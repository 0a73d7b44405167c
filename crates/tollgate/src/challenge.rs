//! Challenge page rendering.
//!
//! The page is static apart from four slots: title, site key, verify path,
//! and the path to return to once the widget's token is accepted.

use tollgate_common::constants::turnstile::{TOKEN_FIELD, WIDGET_SCRIPT_URL};

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <meta name="robots" content="noindex">
  <title>{{TITLE}}</title>
  <script src="{{WIDGET_SCRIPT}}" async defer></script>
  <style>
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body { background: #000; color: #fff; font-family: monospace; }
    main { display: flex; flex-direction: column; align-items: center; padding-top: 120px; }
    h1 { color: #ffa500; font-size: 24px; margin-bottom: 20px; }
    #accessGranted {
      position: fixed; top: 50%; left: 0; width: 100%;
      text-align: center; font-size: 36px; color: #f71735;
      opacity: 0; transform: translateY(-50%);
    }
    #failed { display: none; color: #f71735; margin-top: 16px; }
  </style>
</head>
<body>
  <main>
    <h1>{{TITLE}}</h1>
    <div class="cf-turnstile" data-sitekey="{{SITE_KEY}}" data-callback="onVerification"></div>
    <p id="failed">verification failed, please retry</p>
  </main>
  <div id="accessGranted"></div>
  <script>
    const originalPath = {{ORIGINAL_PATH}};
    const verifyPath = {{VERIFY_PATH}};

    async function onVerification(token) {
      const response = await fetch(verifyPath, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        credentials: 'same-origin',
        body: JSON.stringify({ {{TOKEN_FIELD}}: token })
      });
      const data = await response.json().catch(() => ({ success: false }));
      if (data.success) {
        showAccessGranted();
      } else {
        document.getElementById('failed').style.display = 'block';
        if (window.turnstile) { window.turnstile.reset(); }
      }
    }

    function showAccessGranted() {
      const el = document.getElementById('accessGranted');
      const text = "access granted";
      let i = 0;
      el.style.opacity = '1';
      (function type() {
        if (i < text.length) {
          el.textContent += text.charAt(i++);
          setTimeout(type, 100);
        } else {
          setTimeout(() => { window.location.href = originalPath; }, 1000);
        }
      })();
    }
  </script>
</body>
</html>
"#;

/// Inputs for one rendered page
#[derive(Debug, Clone, Copy)]
pub struct ChallengePage<'a> {
    pub title: &'a str,
    pub site_key: &'a str,
    pub verify_path: &'a str,
    pub original_path: &'a str,
}

/// Render the self-contained challenge document.
pub fn render_challenge_page(page: &ChallengePage<'_>) -> String {
    TEMPLATE
        .replace("{{WIDGET_SCRIPT}}", WIDGET_SCRIPT_URL)
        .replace("{{TITLE}}", &escape_html(page.title))
        .replace("{{SITE_KEY}}", &escape_html(page.site_key))
        .replace("{{TOKEN_FIELD}}", &js_string(TOKEN_FIELD))
        .replace("{{VERIFY_PATH}}", &js_string(page.verify_path))
        .replace("{{ORIGINAL_PATH}}", &js_string(page.original_path))
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// JSON string literal that is also safe inside a `<script>` element.
fn js_string(raw: &str) -> String {
    serde_json::Value::String(raw.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
