use clap::Parser;
use probe_page::store::{SaveRequest, TestStore};
use probe_page::{ProbeConfig, Result, TestRequest, run_with_webdriver};
use serde::Serialize;
use std::path::Path;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    match run(args.command, &config).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            ::log::error!("{}", e);
            std::process::exit(2);
        }
    }
}

fn load_config(args: &Args) -> Result<ProbeConfig> {
    let mut config = match &args.config {
        Some(path) => ProbeConfig::from_file(path)?,
        None => ProbeConfig::default(),
    }
    .with_env_overrides();

    if let Some(url) = &args.webdriver_url {
        config.webdriver_url = url.clone();
    }
    if let Some(dir) = &args.screenshots_dir {
        config.screenshots_dir = dir.clone();
    }
    if let Some(dir) = &args.store_dir {
        config.store_dir = dir.clone();
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Returns whether the command succeeded; test runs report their own outcome
async fn run(command: Command, config: &ProbeConfig) -> Result<bool> {
    let store = TestStore::new(&config.store_dir);

    match command {
        Command::Run {
            url,
            instructions,
            intent,
            name,
        } => {
            let text = match instructions {
                Some(path) => read_text(&path)?,
                None => String::new(),
            };
            let mut request = TestRequest::new(&url, &text);
            request.intent = intent;
            if let Some(name) = name {
                request.test_name = name;
            }

            ::log::info!("Note: runs require a WebDriver server at {}", config.webdriver_url);
            let result = run_with_webdriver(&request, config).await;
            print_json(&result)?;
            Ok(result.success)
        }
        Command::Save {
            project,
            test,
            name,
            url,
            prompt,
            code,
        } => {
            let request = SaveRequest {
                test_id: test,
                test_name: name,
                url,
                prompt,
                generated_code: read_text(&code)?,
                ..SaveRequest::default()
            };
            let path = store.save(&project, &request)?;
            print_json(&serde_json::json!({
                "success": true,
                "message": "Test saved",
                "filePath": path,
            }))?;
            Ok(true)
        }
        Command::RunSaved {
            project,
            test,
            intent,
        } => {
            let (saved, code) = store.load(&project, &test)?;
            let mut request = TestRequest::from_saved(&saved, code);
            request.intent = intent;
            let result = run_with_webdriver(&request, config).await;
            print_json(&result)?;
            Ok(result.success)
        }
        Command::List { project } => {
            print_json(&store.list(project.as_deref())?)?;
            Ok(true)
        }
        Command::Show { project, test } => {
            let (saved, code) = store.load(&project, &test)?;
            print_json(&serde_json::json!({
                "config": saved,
                "testCode": code,
            }))?;
            Ok(true)
        }
        Command::UpdateCode {
            project,
            test,
            code,
        } => {
            store.update_code(&project, &test, &read_text(&code)?)?;
            print_json(&serde_json::json!({
                "success": true,
                "message": "Test code updated",
            }))?;
            Ok(true)
        }
        Command::Delete { project, test } => {
            store.delete(&project, &test)?;
            print_json(&serde_json::json!({
                "success": true,
                "message": "Test deleted",
            }))?;
            Ok(true)
        }
    }
}
