//! Shared fixtures: a three-bone skeleton with one region, its atlas, and a
//! generated page image.

use std::io::Cursor;

use crate::bundle::DroppedFile;

pub const SKELETON: &str = r#"{
  "skeleton": { "spine": "4.0.64", "width": 40, "height": 80 },
  "bones": [
    { "name": "root" },
    { "name": "body", "parent": "root", "y": 50 },
    { "name": "head", "parent": "body", "y": 60, "length": 20 }
  ],
  "slots": [
    { "name": "body", "bone": "body", "attachment": "body" },
    { "name": "head", "bone": "head" }
  ],
  "skins": [
    { "name": "Default", "attachments": { "body": { "body": { "width": 40, "height": 80 } } } },
    { "name": "Alt" }
  ],
  "animations": {
    "Walk": {
      "bones": {
        "body": { "rotate": [ { "time": 0 }, { "time": 1, "value": 30 } ] },
        "head": { "translate": [ { "time": 0 }, { "time": 0.5, "x": 10 } ] }
      }
    }
  }
}"#;

pub const ATLAS: &str = "
body.png
size: 64, 128
format: RGBA8888
filter: Linear, Linear
repeat: none
body
  rotate: false
  xy: 0, 0
  size: 40, 80
  orig: 40, 80
  offset: 0, 0
  index: -1
";

/// Solid PNG of the given size, every pixel (10, 20, 30, 255).
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encode");
    out.into_inner()
}

/// skeleton.json + atlas.atlas + body.png, all in memory.
pub fn hero_drop() -> Vec<DroppedFile> {
    vec![
        DroppedFile::from_bytes("skeleton.json", SKELETON.as_bytes().to_vec()),
        DroppedFile::from_bytes("atlas.atlas", ATLAS.as_bytes().to_vec()),
        DroppedFile::from_bytes("body.png", png_bytes(64, 128)),
    ]
}
