fn main() -> Result<(), Box<dyn std::error::Error>> {
    deepchat::cli::main()
}
