fn main() {
    let cli = kuml::cli::parse();
    kuml::app::init_logging(cli.quiet, cli.verbose);
    let code = kuml::app::run_cli(cli);
    if code != 0 {
        std::process::exit(code);
    }
}
