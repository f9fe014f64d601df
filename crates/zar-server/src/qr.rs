//! QR-code rendering for shortened links.

use crate::object_store::ObjectStore;
use uuid::Uuid;

/// Render a QR code for `data` as SVG and upload it, returning the
/// public URL. Callers treat any failure as "no QR this time".
pub async fn generate_and_upload(
    store: &dyn ObjectStore,
    data: &str,
) -> anyhow::Result<String> {
    let svg = render_svg(data)?;
    let key = format!("qrcodes/{}.svg", Uuid::new_v4());
    store.put_object(&key, svg.into_bytes(), "image/svg+xml").await
}

fn render_svg(data: &str) -> anyhow::Result<String> {
    let code = qrcode::QrCode::new(data.as_bytes())?;
    Ok(code
        .render::<qrcode::render::svg::Color>()
        .min_dimensions(360, 360)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scannable_svg() {
        let svg = render_svg("http://localhost/api/v1/Ab3dE9f").unwrap();
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("<svg"));
    }
}
