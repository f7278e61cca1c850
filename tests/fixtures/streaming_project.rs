use serde::Serialize;
use serde_json::json;

pub struct App;

impl App {
    pub fn get(&self, path: &str, handler: fn(&mut Ctx) -> Result<(), Error>) {}
    pub fn head(&self, path: &str, handler: fn(&mut Ctx) -> Result<(), Error>) {}
}

pub struct Ctx;
pub struct Error;

#[derive(Default)]
pub struct ByteStream;

impl Ctx {
    pub fn json<T: Serialize>(&mut self, value: T) -> Result<(), Error> {
        Ok(())
    }
    pub fn send_file(&mut self, path: &str) -> Result<(), Error> {
        Ok(())
    }
    pub fn send_stream(&mut self, reader: ByteStream) -> Result<(), Error> {
        Ok(())
    }
    pub fn send_status(&mut self, code: u16) -> Result<(), Error> {
        Ok(())
    }
    pub fn status(&mut self, code: u16) -> &mut Ctx {
        self
    }
}

pub fn register(app: &App) {
    app.get("/dynamic/alpha", dynamic_handler);
    app.get("/dynamic/beta", dynamic_handler);
    app.get("/download/:name", download_handler);
    app.get("/stream", stream_handler);
    app.head("/ping", ping_handler);
}

fn dynamic_handler(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.status(200).json(json!({ "message": "ok" }))
}

fn download_handler(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.send_file("./files/report.pdf")
}

fn stream_handler(ctx: &mut Ctx) -> Result<(), Error> {
    let reader = ByteStream::default();
    ctx.status(200).send_stream(reader)
}

fn ping_handler(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.send_status(204)
}
