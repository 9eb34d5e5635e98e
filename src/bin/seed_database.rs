#!/usr/bin/env cargo
//! SmartLab Database Seeder
//!
//! A terminal application for seeding the SmartLab database with a realistic
//! beverage catalog: products, parameters, specification windows and a batch
//! of analysis captures submitted through the regular API.
//!
//! Usage:
//!   `cargo run --bin seed_database -- --url http://localhost:3000 --token YOUR_JWT_TOKEN`

use clap::{Arg, Command};
use console::style;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use reqwest::Client;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Duration;

type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Clone)]
pub struct SeedingConfig {
    pub base_url: String,
    pub jwt_token: String,
    pub client: Client,
}

/// (name, code, stage, category, line)
const PRODUCTS: [(&str, &str, &str, &str, &str); 5] = [
    ("Cola Syrup", "SYR-COLA", "intermediate", "Syrup", "Syrup Room"),
    ("Orange Base", "SYR-ORNG", "intermediate", "Syrup", "Syrup Room"),
    ("Cola 330ml Can", "FG-COLA-330", "finished", "Carbonated Soft Drink", "Can Line 1"),
    ("Orange Soda 1.5L PET", "FG-ORNG-1500", "finished", "Carbonated Soft Drink", "PET Line 2"),
    ("Lemon Soda 500ml", "FG-LMN-500", "finished", "Carbonated Soft Drink", "PET Line 2"),
];

/// (name, unit, input kind)
const PARAMETERS: [(&str, &str, &str); 7] = [
    ("Brix", "°Bx", "numeric"),
    ("pH", "pH", "numeric"),
    ("CO2", "vol", "numeric"),
    ("Titratable Acidity", "g/L", "numeric"),
    ("Appearance", "visual", "enumerated"),
    ("Seal Integrity", "Seal intact", "boolean"),
    ("Taste Panel", "panel", "free_text"),
];

/// Parameters captured per stage as (parameter, min, target, max)
const INTERMEDIATE_SPECS: [(&str, Option<f64>, Option<f64>, Option<f64>); 4] = [
    ("Brix", Some(54.0), Some(55.0), Some(56.0)),
    ("pH", Some(2.4), Some(2.5), Some(2.7)),
    ("Titratable Acidity", Some(9.5), Some(10.0), Some(10.5)),
    ("Appearance", None, None, None),
];

const FINISHED_SPECS: [(&str, Option<f64>, Option<f64>, Option<f64>); 6] = [
    ("Brix", Some(10.0), Some(10.2), Some(10.5)),
    ("pH", Some(2.9), Some(3.1), Some(3.3)),
    ("CO2", Some(3.6), Some(3.8), Some(4.0)),
    ("Seal Integrity", None, None, None),
    ("Appearance", None, None, None),
    ("Taste Panel", None, None, None),
];

const APPEARANCE_CHOICES: [&str; 3] = ["in_control", "deviation", "critical_failure"];
const TASTE_NOTES: [&str; 4] = ["clean", "true to standard", "slightly flat", "sweet finish"];

/// Product seeded with the specification windows it was linked with
#[derive(Debug, Clone)]
struct SeededProduct {
    id: String,
    stage: String,
    specs: Vec<SeededSpec>,
}

#[derive(Debug, Clone)]
struct SeededSpec {
    parameter_id: String,
    input_kind: String,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

#[derive(Debug, Default)]
pub struct CreatedObjects {
    pub products: Vec<Value>,
    pub parameters: Vec<Value>,
    pub product_parameters: Vec<Value>,
    pub analyses: Vec<Value>,
}

pub struct DatabaseSeeder {
    config: SeedingConfig,
    analyses_per_product: usize,
    created_objects: CreatedObjects,
    seeded_products: Vec<SeededProduct>,
}

fn progress_bar(len: usize, template: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(bar_style.progress_chars("#>-"));
    }
    pb
}

/// Draw a raw value for one parameter. Numeric values land inside the window
/// most of the time and just outside it otherwise; some are left blank.
fn generate_value(spec: &SeededSpec, rng: &mut impl Rng) -> Option<Value> {
    if rng.random_bool(0.05) {
        return None;
    }

    match spec.input_kind.as_str() {
        "boolean" => Some(json!(rng.random_bool(0.97))),
        "enumerated" => {
            let pick = if rng.random_bool(0.9) {
                0
            } else {
                rng.random_range(1..APPEARANCE_CHOICES.len())
            };
            Some(json!(APPEARANCE_CHOICES[pick]))
        }
        "free_text" => Some(json!(
            TASTE_NOTES[rng.random_range(0..TASTE_NOTES.len())]
        )),
        _ => {
            let (min, max) = match (spec.min_value, spec.max_value) {
                (Some(min), Some(max)) => (min, max),
                (Some(min), None) => (min, min * 1.2),
                (None, Some(max)) => (max * 0.8, max),
                (None, None) => (0.0, 100.0),
            };
            let width = (max - min).max(0.1);
            let value = if rng.random_bool(0.85) {
                rng.random_range(min..=max)
            } else if rng.random_bool(0.5) {
                min - rng.random_range(0.01..=width * 0.3)
            } else {
                max + rng.random_range(0.01..=width * 0.3)
            };
            Some(json!(format!("{value:.2}")))
        }
    }
}

impl DatabaseSeeder {
    pub fn new(base_url: &str, jwt_token: String, analyses_per_product: usize) -> SeedResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            config: SeedingConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                jwt_token,
                client,
            },
            analyses_per_product,
            created_objects: CreatedObjects::default(),
            seeded_products: Vec::new(),
        })
    }

    /// POST several payloads to one endpoint with controlled concurrency
    async fn post_parallel(
        &self,
        endpoint: &str,
        payloads: Vec<Value>,
        max_concurrent: usize,
        pb: &ProgressBar,
    ) -> Vec<Result<Value, String>> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut tasks = Vec::new();

        for payload in payloads {
            let sem = Arc::clone(&semaphore);
            let config = self.config.clone();
            let pb_clone = pb.clone();
            let url = format!("{}{}", config.base_url, endpoint);
            let endpoint = endpoint.to_string();

            tasks.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| format!("Semaphore closed: {e}"))?;

                let response = config
                    .client
                    .post(&url)
                    .header("authorization", format!("Bearer {}", config.jwt_token))
                    .json(&payload)
                    .send()
                    .await;

                let result = match response {
                    Ok(resp) if resp.status().is_success() => resp
                        .json::<Value>()
                        .await
                        .map_err(|e| format!("JSON parse error: {e}")),
                    Ok(resp) => {
                        let status = resp.status();
                        let error_text = resp.text().await.unwrap_or_default();
                        Err(format!("HTTP {status} {endpoint}: {error_text}"))
                    }
                    Err(e) => Err(format!("Request error {endpoint}: {e}")),
                };

                pb_clone.inc(1);
                result
            }));
        }

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap_or_else(|e| Err(format!("Task join error: {e}"))))
            .collect()
    }

    async fn post(&self, endpoint: &str, data: &Value) -> SeedResult<Value> {
        let url = format!("{}{}", self.config.base_url, endpoint);
        let response = self
            .config
            .client
            .post(&url)
            .header("authorization", format!("Bearer {}", self.config.jwt_token))
            .json(data)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<Value>().await?)
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(format!("HTTP {status} {endpoint}: {error_text}").into())
        }
    }

    pub async fn test_connection(&self) -> SeedResult<()> {
        let url = format!("{}/healthz", self.config.base_url);
        let response = self.config.client.get(&url).send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("Health check returned {}", response.status()).into())
        }
    }

    pub async fn create_products(&mut self) -> SeedResult<()> {
        println!("{} Creating products...", style("[1/4]").bold().dim());
        let pb = progress_bar(
            PRODUCTS.len(),
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} products",
        );

        for (name, code, stage, category, line) in PRODUCTS {
            let product = self
                .post(
                    "/api/products",
                    &json!({
                        "name": name,
                        "code": code,
                        "stage": stage,
                        "category": category,
                        "line": line,
                        "active": true
                    }),
                )
                .await?;
            self.created_objects.products.push(product);
            pb.inc(1);
        }

        pb.finish_and_clear();
        println!(
            "{} Created {} products",
            style("✅").green(),
            self.created_objects.products.len()
        );
        Ok(())
    }

    pub async fn create_parameters(&mut self) -> SeedResult<()> {
        println!("{} Creating parameters...", style("[2/4]").bold().dim());
        let pb = progress_bar(
            PARAMETERS.len(),
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} parameters",
        );

        for (name, unit, input_kind) in PARAMETERS {
            let parameter = self
                .post(
                    "/api/parameters",
                    &json!({"name": name, "unit": unit, "input_kind": input_kind}),
                )
                .await?;
            self.created_objects.parameters.push(parameter);
            pb.inc(1);
        }

        pb.finish_and_clear();
        println!(
            "{} Created {} parameters",
            style("✅").green(),
            self.created_objects.parameters.len()
        );
        Ok(())
    }

    pub async fn link_specifications(&mut self) -> SeedResult<()> {
        println!(
            "{} Linking specification windows...",
            style("[3/4]").bold().dim()
        );

        let parameters: HashMap<String, (String, String)> = self
            .created_objects
            .parameters
            .iter()
            .filter_map(|parameter| {
                Some((
                    parameter["name"].as_str()?.to_string(),
                    (
                        parameter["id"].as_str()?.to_string(),
                        parameter["input_kind"].as_str()?.to_string(),
                    ),
                ))
            })
            .collect();

        let mut payloads = Vec::new();
        let mut seeded_products = Vec::new();
        for product in &self.created_objects.products {
            let (Some(product_id), Some(stage)) = (product["id"].as_str(), product["stage"].as_str())
            else {
                continue;
            };
            let windows: &[(&str, Option<f64>, Option<f64>, Option<f64>)] = if stage == "finished" {
                &FINISHED_SPECS
            } else {
                &INTERMEDIATE_SPECS
            };

            let mut specs = Vec::new();
            for (order_index, (name, min, target, max)) in windows.iter().enumerate() {
                let Some((parameter_id, input_kind)) = parameters.get(*name) else {
                    continue;
                };
                payloads.push(json!({
                    "product_id": product_id,
                    "parameter_id": parameter_id,
                    "min_value": min,
                    "target_value": target,
                    "max_value": max,
                    "order_index": order_index,
                    "required": input_kind == "numeric"
                }));
                specs.push(SeededSpec {
                    parameter_id: parameter_id.clone(),
                    input_kind: input_kind.clone(),
                    min_value: *min,
                    max_value: *max,
                });
            }
            seeded_products.push(SeededProduct {
                id: product_id.to_string(),
                stage: stage.to_string(),
                specs,
            });
        }

        let pb = progress_bar(
            payloads.len(),
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} links",
        );
        for result in self
            .post_parallel("/api/product_parameters", payloads, 8, &pb)
            .await
        {
            match result {
                Ok(link) => self.created_objects.product_parameters.push(link),
                Err(e) => println!("{} {e}", style("⚠️").yellow()),
            }
        }
        pb.finish_and_clear();

        self.seeded_products = seeded_products;
        println!(
            "{} Linked {} specifications",
            style("✅").green(),
            self.created_objects.product_parameters.len()
        );
        Ok(())
    }

    pub async fn submit_analyses(&mut self) -> SeedResult<()> {
        println!("{} Submitting analyses...", style("[4/4]").bold().dim());

        let mut payloads = Vec::new();
        let mut rng = rand::rng();
        for product in &self.seeded_products {
            for _ in 0..self.analyses_per_product {
                let mut values = Map::new();
                for spec in &product.specs {
                    if let Some(value) = generate_value(spec, &mut rng) {
                        values.insert(spec.parameter_id.clone(), value);
                    }
                }
                let lot_reference = if rng.random_bool(0.8) {
                    format!("L-{}", rng.random_range(1000..10000))
                } else {
                    String::new()
                };
                payloads.push(json!({
                    "stage_kind": product.stage,
                    "product_id": product.id,
                    "lot_reference": lot_reference,
                    "values": values
                }));
            }
        }
        drop(rng);

        let pb = progress_bar(
            payloads.len(),
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} analyses",
        );
        let mut out_of_spec = 0;
        for result in self.post_parallel("/api/analyses", payloads, 4, &pb).await {
            match result {
                Ok(analysis) => {
                    if analysis["overall_status"] == "out_of_spec" {
                        out_of_spec += 1;
                    }
                    self.created_objects.analyses.push(analysis);
                }
                Err(e) => println!("{} {e}", style("⚠️").yellow()),
            }
        }
        pb.finish_and_clear();

        println!(
            "{} Submitted {} analyses ({} out of spec)",
            style("✅").green(),
            self.created_objects.analyses.len(),
            style(out_of_spec).bold().red()
        );
        Ok(())
    }

    pub async fn seed_database(&mut self) -> SeedResult<()> {
        println!();
        println!("{}", style("SmartLab Database Seeder").bold().blue());
        println!(
            "{}",
            style("Creating a beverage catalog and sample captures...").dim()
        );
        println!();

        self.test_connection().await?;
        self.create_products().await?;
        self.create_parameters().await?;
        self.link_specifications().await?;
        self.submit_analyses().await?;

        self.display_summary();
        Ok(())
    }

    fn display_summary(&self) {
        println!();
        println!("{}", style("🎉 Database Seeding Complete!").bold().green());
        println!("{}", style("═".repeat(50)).dim());

        for (name, count) in [
            ("Products", self.created_objects.products.len()),
            ("Parameters", self.created_objects.parameters.len()),
            ("Specifications", self.created_objects.product_parameters.len()),
            ("Analyses", self.created_objects.analyses.len()),
        ] {
            println!("  {:<16} {}", style(name).cyan(), style(count).bold().green());
        }

        println!();
        println!("{} Next Steps:", style("🎯").cyan());
        println!("  {} Browse the API docs at /api/docs", style("•").dim());
        println!(
            "  {} List captures with GET /api/analyses?product_id=...",
            style("•").dim()
        );
    }
}

#[tokio::main]
async fn main() -> SeedResult<()> {
    let matches = Command::new("SmartLab Database Seeder")
        .version("1.0")
        .about("Seeds the SmartLab database with a beverage catalog and sample analyses")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("API base URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .value_name("JWT_TOKEN")
                .help("JWT authentication token")
                .required(true),
        )
        .arg(
            Arg::new("analyses")
                .short('n')
                .long("analyses")
                .value_name("COUNT")
                .help("Analyses to submit per product")
                .value_parser(clap::value_parser!(usize))
                .default_value("5"),
        )
        .get_matches();

    let base_url = matches
        .get_one::<String>("url")
        .cloned()
        .unwrap_or_default();
    let jwt_token = matches
        .get_one::<String>("token")
        .cloned()
        .ok_or("a JWT token is required")?;
    let analyses_per_product = matches.get_one::<usize>("analyses").copied().unwrap_or(5);

    println!("{}", style("SmartLab Database Seeder v1.0").bold());
    println!("{}", style("━".repeat(40)).dim());
    println!("API URL: {}", style(&base_url).cyan());
    println!(
        "Token:   {}...{}",
        style("*".repeat(8)).dim(),
        style(&jwt_token[jwt_token.len().saturating_sub(8)..]).dim()
    );

    let mut seeder = DatabaseSeeder::new(&base_url, jwt_token, analyses_per_product)?;
    seeder.seed_database().await?;

    Ok(())
}
