mod app;
mod backdrop;
mod canvas;
mod chaos;
mod config;
mod display;
mod driver;
mod error;
mod generator;
mod geom;
mod input;
mod path;
mod random;
mod render;
mod scale;
mod staircase;

use anyhow::Result;

fn main() -> Result<()> {
    app::run()
}
