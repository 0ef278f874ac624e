use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("reviewlens")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract ratings, price and review summaries from product pages")
        .arg(
            clap::arg!(--csv <PATH> "CSV file with a `url` column (batch mode)")
                .value_parser(clap::value_parser!(std::path::PathBuf))
                .conflicts_with("url"),
        )
        .arg(clap::arg!(--url <URL> "Single product page URL; the report is printed to stdout"))
        .arg(clap::arg!(--"api-key" <KEY> "Gemini API key"))
        .arg(clap::arg!(--model <NAME> "Gemini model name").default_value("gemini-2.0-flash"))
        .arg(
            clap::arg!(--"results-dir" <DIR> "Directory for result_<n>.json and combined_results.json")
                .default_value("results")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--threshold <SCORE> "Block relevance threshold for content pruning").default_value("0.48"))
        .arg(clap::arg!(--"max-attempts" <NUM> "Maximum JSON reformat attempts per URL").default_value("8"))
        .arg(clap::arg!(--"retry-delay" <SECS> "Seconds to wait between reformat attempts").default_value("1"))
        .arg(clap::arg!(--timeout <SECS> "Page load timeout in seconds").default_value("30"))
        .arg(clap::arg!(--http "Fetch pages with a plain HTTP GET instead of a headless browser"))
        .arg(
            clap::arg!(--chrome <PATH> "Chromium executable (auto-detected by default)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"no-sandbox" "Launch Chromium without its sandbox"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    for shell in [
        clap_complete::Shell::Bash,
        clap_complete::Shell::Zsh,
        clap_complete::Shell::Fish,
        clap_complete::Shell::PowerShell,
    ] {
        clap_complete::generate_to(shell, &mut cmd, "reviewlens", &completions_dir).unwrap();
    }

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
