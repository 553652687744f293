fn main() -> anyhow::Result<()> {
    emmcprov::run()
}
