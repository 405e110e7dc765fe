use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart;

#[derive(Parser)]
#[command(name = "control-cli")]
#[command(about = "Management CLI for the appliance control plane", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:10000")]
    url: String,

    /// Bearer token, when the control plane is configured with one
    #[arg(short, long, env = "CONTROL_PLANE_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Restart every managed service
    Restart,
    /// Upload an enrichment JSON file
    UploadEnrichment { file: PathBuf },
    /// Upload the registry server configuration
    UploadIgluConfig { file: PathBuf },
    /// Register an external schema registry
    AddExternalIglu {
        #[arg(long)]
        vendor_prefix: String,
        #[arg(long)]
        uri: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        priority: i64,
        #[arg(long)]
        apikey: Option<String>,
    },
    /// Set the local registry API key
    LocalIgluApikey { apikey: String },
    /// Change the reverse proxy credentials
    Credentials { username: String, password: String },
    /// Bind the reverse proxy to a domain name
    DomainName { domain: String },
    /// Print the appliance version
    Version,
}

async fn file_part(path: &PathBuf) -> Result<multipart::Part, Box<dyn std::error::Error>> {
    let contents = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(multipart::Part::bytes(contents).file_name(filename))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }
    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let url = |path: &str| format!("{}{}", cli.url.trim_end_matches('/'), path);

    let request = match &cli.command {
        Commands::Restart => client.put(url("/restart-services")),
        Commands::UploadEnrichment { file } => client
            .post(url("/enrichments"))
            .multipart(multipart::Form::new().part("enrichmentjson", file_part(file).await?)),
        Commands::UploadIgluConfig { file } => client
            .post(url("/iglu-config"))
            .multipart(multipart::Form::new().part("igluserverhocon", file_part(file).await?)),
        Commands::AddExternalIglu {
            vendor_prefix,
            uri,
            name,
            priority,
            apikey,
        } => {
            let priority = priority.to_string();
            let mut form = vec![
                ("vendor_prefix", vendor_prefix.as_str()),
                ("uri", uri.as_str()),
                ("name", name.as_str()),
                ("priority", priority.as_str()),
            ];
            if let Some(apikey) = apikey {
                form.push(("apikey", apikey.as_str()));
            }
            client.post(url("/external-iglu")).form(&form)
        }
        Commands::LocalIgluApikey { apikey } => client
            .post(url("/local-iglu-apikey"))
            .form(&[("local_iglu_apikey", apikey)]),
        Commands::Credentials { username, password } => client
            .post(url("/credentials"))
            .form(&[("new_username", username), ("new_password", password)]),
        Commands::DomainName { domain } => client
            .post(url("/domain-name"))
            .form(&[("domain_name", domain)]),
        Commands::Version => client.get(url("/version")),
    };

    let res = request.send().await?;
    let status = res.status();
    let body = res.text().await?;
    if status.is_success() {
        println!("{}", body.trim_end());
    } else {
        eprintln!("Error: control plane returned status {}", status);
        eprintln!("Response: {}", body.trim_end());
        std::process::exit(1);
    }

    Ok(())
}
