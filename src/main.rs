fn main() {
    if let Err(err) = sheet_remap::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
