//! `viewcap referer <url>` – show how a referer header would be stored.

use viewcap_core::referer;

pub fn run_referer(url: &str) {
    match referer::referer_origin(Some(url)) {
        Some(origin) => println!("{origin}"),
        None => println!("no referer"),
    }
}
