use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub struct App;

impl App {
    pub fn get(&self, path: &str, handler: fn(&mut Ctx) -> Result<(), Error>) {}
}

pub struct Ctx;
pub struct Error;

impl Ctx {
    pub fn query(&self, key: &str) -> String {
        String::new()
    }
    pub fn query_int(&self, key: &str, default: i64) -> i64 {
        default
    }
    pub fn query_bool(&self, key: &str) -> bool {
        false
    }
    pub fn query_float(&self, key: &str) -> f64 {
        0.0
    }
    pub fn query_parser<T: DeserializeOwned>(&self, out: &mut T) -> Result<(), Error> {
        Ok(())
    }
    pub fn json<T: Serialize>(&mut self, value: T) -> Result<(), Error> {
        Ok(())
    }
    pub fn status(&mut self, code: u16) -> &mut Ctx {
        self
    }
}

pub fn register(app: &App) {
    app.get("/search", search_handler);
}

fn search_handler(ctx: &mut Ctx) -> Result<(), Error> {
    let page = ctx.query_int("page", 1);
    if page <= 0 {
        return ctx.status(400).json(json!({ "error": "invalid page" }));
    }

    let include_archived = ctx.query_bool("archived");
    let result_limit = ctx.query_float("limit") as i64;

    let mut filters = SearchFilter::default();
    if ctx.query_parser(&mut filters).is_err() {
        return ctx.status(400).json(json!({ "error": "invalid filters" }));
    }

    ctx.status(200).json(json!({
        "page": page,
        "archived": include_archived,
        "limit": result_limit,
        "tag": filters.tag,
    }))
}

#[derive(Default, Deserialize)]
pub struct SearchFilter {
    #[serde(rename = "tag")]
    pub tag: String,
    #[serde(rename = "limit")]
    pub limit: i64,
}
