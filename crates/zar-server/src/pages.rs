//! Served HTML pages.
//!
//! Only one page lives in the core: the password challenge. Its form
//! contract is fixed (it posts a `password` field to
//! `POST /api/v1/{short_code}/verify`) while the styling is free.

/// Render the password challenge for a protected short code.
pub fn password_challenge(short_code: &str, error: bool) -> String {
    let error_html = if error {
        r#"<div class="error">Wrong password. Try again.</div>"#
    } else {
        ""
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Protected link</title>
    <style>
        :root {{
            --background: #f8f9fa;
            --surface: #ffffff;
            --primary: #d8775a;
            --text: #1e1e1e;
            --danger-bg: #fdecea;
            --danger-border: #f5c6c0;
            --danger-text: #c0392b;
        }}
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: system-ui, sans-serif;
            background: var(--background);
            color: var(--text);
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            padding: 1rem;
        }}
        .card {{
            background: var(--surface);
            padding: 40px;
            border-radius: 12px;
            box-shadow: 0 10px 40px rgba(0, 0, 0, 0.1);
            max-width: 400px;
            width: 100%;
        }}
        .short-code {{
            background: var(--background);
            padding: 8px 12px;
            border-radius: 6px;
            font-family: monospace;
            font-size: 16px;
            text-align: center;
            margin-bottom: 20px;
        }}
        .error {{
            background: var(--danger-bg);
            border: 1px solid var(--danger-border);
            color: var(--danger-text);
            padding: 12px;
            border-radius: 6px;
            margin-bottom: 20px;
        }}
        label {{
            display: block;
            font-weight: 500;
            margin-bottom: 8px;
            font-size: 14px;
        }}
        input[type="password"] {{
            width: 100%;
            padding: 12px 16px;
            border: 2px solid #e0e0e0;
            border-radius: 8px;
            font-size: 16px;
            margin-bottom: 20px;
        }}
        input[type="password"]:focus {{
            outline: none;
            border-color: var(--primary);
        }}
        button {{
            width: 100%;
            padding: 14px;
            background: var(--primary);
            color: white;
            border: none;
            border-radius: 8px;
            font-size: 16px;
            font-weight: 600;
            cursor: pointer;
        }}
    </style>
</head>
<body>
    <div class="card">
        <div class="short-code">/{short_code}</div>
        {error_html}
        <form method="POST" action="/api/v1/{short_code}/verify">
            <label for="password">This link is password protected:</label>
            <input type="password" id="password" name="password" required autofocus
                   placeholder="••••••••">
            <button type="submit">Open link</button>
        </form>
    </div>
</body>
</html>"##
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_contract_is_fixed() {
        let html = password_challenge("Ab3dE9f", false);
        assert!(html.contains(r#"action="/api/v1/Ab3dE9f/verify""#));
        assert!(html.contains(r#"name="password""#));
        assert!(html.contains(r#"method="POST""#));
        assert!(!html.contains("Wrong password"));
    }

    #[test]
    fn error_variant_shows_the_failure() {
        let html = password_challenge("Ab3dE9f", true);
        assert!(html.contains("Wrong password"));
    }
}
