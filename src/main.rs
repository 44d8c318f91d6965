fn main() {
    pressboard_lib::run()
}
