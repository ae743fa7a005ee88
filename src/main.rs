fn main() {
    seat_hunter_lib::run()
}
