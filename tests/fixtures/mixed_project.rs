use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub struct App;

impl App {
    pub fn get(&self, path: &str, handler: fn(&mut Ctx) -> Result<(), Error>) {}
    pub fn post(&self, path: &str, handler: fn(&mut Ctx) -> Result<(), Error>) {}
    pub fn group(&self, prefix: &str) -> App {
        App
    }
}

pub struct Ctx;
pub struct Error;
pub struct FileHeader;

impl Ctx {
    pub fn query(&self, key: &str) -> String {
        String::new()
    }
    pub fn body_parser<T: DeserializeOwned>(&mut self, out: &mut T) -> Result<(), Error> {
        Ok(())
    }
    pub fn form_file(&mut self, name: &str) -> Result<FileHeader, Error> {
        Ok(FileHeader)
    }
    pub fn json<T: Serialize>(&mut self, value: T) -> Result<(), Error> {
        Ok(())
    }
    pub fn status(&mut self, code: u16) -> &mut Ctx {
        self
    }
}

pub fn ok_result<T: Serialize>(ctx: &mut Ctx, payload: T) -> Result<(), Error> {
    ctx.status(200).json(payload)
}

pub fn bad_request(ctx: &mut Ctx, msg: &str) -> Result<(), Error> {
    ctx.status(400).json(json!({ "error": msg }))
}

pub fn register(app: &App) {
    app.get("/status", health_handler);

    let series = app.group("/series");
    series.get("/history/:sourceId", history_by_source_handler);
    series.get("/cheapest", cheapest_handler);

    let admin = app.group("/admin");
    admin.post("/upload", upload_handler);

    app.post("/compute", compute_handler);
}

fn health_handler(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.status(200).json(json!({ "status": "ok" }))
}

fn history_by_source_handler(ctx: &mut Ctx) -> Result<(), Error> {
    let source_id = ctx.query("sourceId");
    if source_id.is_empty() {
        return bad_request(ctx, "sourceId required");
    }
    let mut limits: Vec<String> = Vec::new();
    let limit_value = ctx.query("limit");
    if !limit_value.is_empty() {
        limits.push(limit_value);
    }
    ok_result(
        ctx,
        HistoryResponse {
            source_id,
            limits,
            items: vec![HistoryItem {
                id: "1".to_string(),
                change: "created".to_string(),
            }],
        },
    )
}

fn cheapest_handler(ctx: &mut Ctx) -> Result<(), Error> {
    let mut titles: Vec<String> = Vec::new();
    let title_value = ctx.query("title");
    if !title_value.is_empty() {
        titles.push(title_value);
    }
    ok_result(ctx, json!({ "titles": titles }))
}

fn upload_handler(ctx: &mut Ctx) -> Result<(), Error> {
    if ctx.form_file("file").is_err() {
        return bad_request(ctx, "file required");
    }
    ok_result(ctx, UploadResponse { processed: 1 })
}

fn compute_handler(ctx: &mut Ctx) -> Result<(), Error> {
    let mut payload = ComputePayload::default();
    if ctx.body_parser(&mut payload).is_err() {
        return bad_request(ctx, "invalid payload");
    }
    let resp = ComputeResponse {
        id: payload.label.clone(),
        count: payload.values.len(),
    };
    ctx.status(201).json(resp)
}

#[derive(Serialize)]
pub struct HistoryResponse {
    #[serde(rename = "sourceId")]
    pub source_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub limits: Vec<String>,
    pub items: Vec<HistoryItem>,
}

#[derive(Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub change: String,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub processed: i64,
}

#[derive(Default, Deserialize)]
pub struct ComputePayload {
    pub label: String,
    pub values: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Serialize)]
pub struct ComputeResponse {
    pub id: String,
    pub count: usize,
}
