fn main() -> anyhow::Result<()> {
    xorphf::cli::run()
}
