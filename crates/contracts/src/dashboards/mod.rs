pub mod d402_book_reports;
