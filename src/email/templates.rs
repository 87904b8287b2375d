pub fn render_reset_code(name: &str, code: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset Request</h2>
    <p>Hi {name},</p>
    <p>You requested to reset your password. Use this code to set a new one:</p>
    <p style="font-size: 28px; letter-spacing: 4px; font-weight: bold;">{code}</p>
    <p style="color: #666; font-size: 14px;">This code is valid for 10 minutes only. If you didn't request a password reset, ignore this email.</p>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_template_contains_code_and_name() {
        let html = render_reset_code("Ada", "123456");
        assert!(html.contains("123456"));
        assert!(html.contains("Hi Ada,"));
    }
}
