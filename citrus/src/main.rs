fn main() -> eyre::Result<()> {
    citrus::App::new().run()
}
