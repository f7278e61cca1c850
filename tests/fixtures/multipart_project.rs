use serde::Serialize;
use serde_json::json;

pub struct App;

impl App {
    pub fn post(&self, path: &str, handler: fn(&mut Ctx) -> Result<(), Error>) {}
}

pub struct Ctx;
pub struct Error;
pub struct FileHeader;

pub struct MultipartForm;

impl MultipartForm {
    pub fn files(&self, name: &str) -> Vec<FileHeader> {
        Vec::new()
    }
}

impl Ctx {
    pub fn form_value(&self, name: &str) -> String {
        String::new()
    }
    pub fn multipart_form(&mut self) -> Result<MultipartForm, Error> {
        Ok(MultipartForm)
    }
    pub fn save_file(&mut self, file: &FileHeader, dst: &str) -> Result<(), Error> {
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
    app.post("/submit", submit_handler);
}

fn submit_handler(ctx: &mut Ctx) -> Result<(), Error> {
    let name = ctx.form_value("name");
    let form = ctx.multipart_form()?;
    let files = form.files("attachments");
    for file in &files {
        ctx.save_file(file, "./uploads")?;
    }
    ctx.status(201).json(json!({
        "name": name,
        "attachments": files.len(),
    }))
}
