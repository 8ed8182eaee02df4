use axum::{http::header, routing::get, Router};
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::net::SocketAddr;

/// A PNG of the given size.
pub fn create_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    out.into_inner()
}

/// Serve a few fixed files on an ephemeral local port, standing in for an external host.
pub async fn spawn_external_host() -> SocketAddr {
    let app = Router::new()
        .route(
            "/images/cat.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], create_png(4, 4)) }),
        )
        .route(
            "/notes/readme",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    "hello from afar",
                )
            }),
        )
        .route(
            "/big.bin",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/octet-stream")],
                    vec![0u8; 2 * 1024 * 1024],
                )
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind external host");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}
