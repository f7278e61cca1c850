pub struct App;

impl App {
    pub fn get(&self, path: &str, handler: fn(&mut Ctx) -> Result<(), Error>) {}
}

pub struct Ctx;
pub struct Error;

impl Ctx {
    pub fn send_string(&mut self, body: &str) -> Result<(), Error> {
        Ok(())
    }
    pub fn send_status(&mut self, code: u16) -> Result<(), Error> {
        Ok(())
    }
    pub fn redirect(&mut self, target: &str, code: u16) -> Result<(), Error> {
        Ok(())
    }
}

pub fn register(app: &App) {
    app.get("/hello", hello_handler);
    app.get("/accepted", accepted_handler);
    app.get("/go", redirect_handler);
}

fn hello_handler(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.send_string("hello world")
}

fn accepted_handler(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.send_status(202)
}

fn redirect_handler(ctx: &mut Ctx) -> Result<(), Error> {
    ctx.redirect("/target", 302)
}
