fn main() {
    minsh::shell_main()
}
