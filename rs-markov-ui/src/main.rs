use std::time::Duration;

use eframe::{egui, Frame};
use egui::Context;

use reqwest::blocking::Client;
use reqwest::Result;
use serde::Deserialize;

/// Token mode on the UI side.
/// Serialized manually into the `mode` query parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Char,
    Word,
}

impl Mode {
    fn as_param(&self) -> &'static str {
        match self {
            Mode::Char => "char",
            Mode::Word => "word",
        }
    }
}

/// Body of `/v1/stats`.
#[derive(Debug, Deserialize)]
struct Stats {
    order: usize,
    trained: bool,
    state_count: usize,
    average_branching_factor: f64,
}

/// REST context holding a reusable blocking HTTP client.
struct RESTContext {
    client: Client,
    base_url: String,
}

impl RESTContext {
    /// Creates a new REST context with a timeout.
    ///
    /// The server address is read from `RS_MARKOV_URL`.
    fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::new(30, 0))
            .build()?;
        let base_url = std::env::var("RS_MARKOV_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_owned());
        Ok(Self { client, base_url })
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), route)
    }

    /// Sends a PUT request to `/v1/model` to start over with a new order.
    fn put_model(&self, order: usize) -> Result<String> {
        let response = self.client
            .put(self.url("/v1/model"))
            .query(&[("order", order.to_string())])
            .send()?
            .error_for_status()?;
        response.text()
    }

    /// Sends the corpus to `/v1/train`.
    fn put_train(&self, corpus: &str, mode: Mode) -> Result<String> {
        let response = self.client
            .put(self.url("/v1/train"))
            .query(&[("mode", mode.as_param())])
            .body(corpus.to_owned())
            .send()?
            .error_for_status()?;
        response.text()
    }

    /// Sends a GET request to `/v1/generate` with query parameters.
    fn get_generated(&self, params: &[(String, String)]) -> Result<String> {
        let response = self.client
            .get(self.url("/v1/generate"))
            .query(params)
            .send()?
            .error_for_status()?;
        response.text()
    }

    fn get_stats(&self) -> Result<Stats> {
        self.client
            .get(self.url("/v1/stats"))
            .send()?
            .error_for_status()?
            .json()
    }

    /// Sends a DELETE request to `/v1/model`.
    fn delete_model(&self) -> Result<String> {
        let response = self.client
            .delete(self.url("/v1/model"))
            .send()?
            .error_for_status()?;
        response.text()
    }
}

/// Global UI state (MUST persist between frames in egui).
struct GeneratorUI {
    rest: RESTContext,
    status: Option<String>,
    output: Option<String>,
    stats: Option<Stats>,

    corpus: String,
    corpus_path: String,

    order: usize,
    mode: Mode,
    length: usize,
    temperature: f64,
}

impl GeneratorUI {
    /// Initializes the UI with sane defaults.
    fn new() -> Result<Self> {
        let mut generator = Self {
            rest: RESTContext::new()?,
            status: None,
            output: None,
            stats: None,

            corpus: String::new(),
            corpus_path: String::new(),

            order: 2,
            mode: Mode::Char,
            length: 200,
            temperature: 1.0,
        };
        generator.refresh_stats();
        if let Some(stats) = &generator.stats {
            generator.order = stats.order;
        }
        Ok(generator)
    }

    /// Builds the query parameters for the generate request.
    fn build_query(&self) -> Vec<(String, String)> {
        vec![
            ("length".into(), self.length.to_string()),
            ("mode".into(), self.mode.as_param().into()),
            ("temperature".into(), self.temperature.to_string()),
        ]
    }

    /// Loads the corpus text area from a local file.
    fn load_file(&mut self) {
        match std::fs::read_to_string(self.corpus_path.trim()) {
            Ok(text) => {
                self.status = Some(format!("Loaded {} characters", text.chars().count()));
                self.corpus = text;
            }
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    /// Recreates the model with the selected order, then trains it.
    fn train(&mut self) {
        let result = self.rest
            .put_model(self.order)
            .and_then(|_| self.rest.put_train(&self.corpus, self.mode));
        match result {
            Ok(message) => self.status = Some(message),
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
        self.refresh_stats();
    }

    /// Performs the generation request.
    fn get_generated(&mut self) {
        let params = self.build_query();
        match self.rest.get_generated(&params) {
            Ok(text) => self.output = Some(text),
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
    }

    fn clear(&mut self) {
        match self.rest.delete_model() {
            Ok(message) => self.status = Some(message),
            Err(e) => self.status = Some(format!("Error: {e}")),
        }
        self.output = None;
        self.refresh_stats();
    }

    fn refresh_stats(&mut self) {
        match self.rest.get_stats() {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => {
                self.stats = None;
                self.status = Some(format!("Error: {e}"));
            }
        }
    }
}

impl eframe::App for GeneratorUI {
    /// UI update loop (called every frame).
    fn update(&mut self, ctx: &Context, _: &mut Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {

            // Corpus source
            ui.horizontal(|ui| {
                ui.label("Corpus file");
                ui.text_edit_singleline(&mut self.corpus_path);
                if ui.button("Load").clicked() {
                    self.load_file();
                }
            });
            egui::ScrollArea::vertical()
                .max_height(160.0)
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.corpus)
                            .hint_text("Paste sample text here")
                            .desired_width(f32::INFINITY),
                    );
                });

            ui.separator();

            egui::Grid::new("generator_grid")
                .num_columns(2)
                .spacing([20.0, 6.0])
                .striped(true)
                .show(ui, |ui| {

                    // order
                    ui.label("Order");
                    ui.add(
                        egui::DragValue::new(&mut self.order)
                            .range(1..=10)
                            .speed(1),
                    );
                    ui.end_row();

                    // mode
                    ui.label("Tokens");
                    ui.horizontal(|ui| {
                        ui.radio_value(&mut self.mode, Mode::Char, "Characters");
                        ui.radio_value(&mut self.mode, Mode::Word, "Words");
                    });
                    ui.end_row();

                    // length
                    ui.label("Length");
                    ui.add(
                        egui::DragValue::new(&mut self.length)
                            .range(0..=10_000)
                            .speed(1),
                    );
                    ui.end_row();

                    // temperature
                    ui.label("Temperature");
                    ui.add(
                        egui::DragValue::new(&mut self.temperature)
                            .range(0.0..=5.0)
                            .speed(0.01),
                    );
                    ui.end_row();
                });

            ui.separator();

            ui.horizontal(|ui| {
                if ui.add_sized([120.0, 32.0], egui::Button::new("Train")).clicked() {
                    self.train();
                }
                if ui.add_sized([120.0, 32.0], egui::Button::new("Generate")).clicked() {
                    self.get_generated();
                }
                if ui.add_sized([120.0, 32.0], egui::Button::new("Clear")).clicked() {
                    self.clear();
                }
            });

            match &self.stats {
                Some(stats) if stats.trained => {
                    ui.label(format!(
                        "Order {}: {} states, average branching factor {:.2}",
                        stats.order, stats.state_count, stats.average_branching_factor
                    ));
                }
                Some(stats) => {
                    ui.label(format!("Order {}: not trained", stats.order));
                }
                None => {
                    ui.label("Server unavailable");
                }
            }

            if let Some(status) = &self.status {
                ui.label(status);
            }

            ui.separator();

            // Output
            egui::ScrollArea::vertical().show(ui, |ui| {
                match &self.output {
                    Some(text) => {
                        ui.label(text);
                    }
                    None => {
                        ui.label("Click Generate to start");
                    }
                }
            });
        });
    }
}

/// Application entry point.
fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 620.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "rs-markov",
        options,
        Box::new(|_| Ok(Box::new(GeneratorUI::new()?))),
    )
}

