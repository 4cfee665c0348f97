// PPU test suite, split by concern

mod registers;
