fn main() {
    if let Err(err) = pnml_conformance_renderer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
