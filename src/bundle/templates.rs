//! Fixed template sources bundled into the binary.

use std::borrow::Cow;

use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/icons/"]
struct IconTemplates;

pub const ICON_192: &str = "icon-192.png";
pub const ICON_512: &str = "icon-512.png";

/// Raw bytes of a placeholder icon, if it was embedded
pub fn icon(name: &str) -> Option<Cow<'static, [u8]>> {
    IconTemplates::get(name).map(|file| file.data)
}
