use askama::Template;

use crate::types::VideoInfo;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub url: &'a str,
}

#[derive(Template)]
#[template(path = "formats.html")]
pub struct FormatsPage<'a> {
    pub url: &'a str,
    pub info: &'a VideoInfo,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage<'a> {
    pub status: u16,
    pub message: &'a str,
}
