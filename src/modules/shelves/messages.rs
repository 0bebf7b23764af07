//! User-visible text of the shelf pages.

use std::fmt;

use atlas_db::BookId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    InvalidShelf,
    AddNotAllowed,
    EditNotAllowed,
    AlreadyOnShelf { shelf: String },
    InvalidBookId { book_id: BookId },
    AddDatabaseError { error: String },
    BookAdded { shelf: String },
    CreateShelfTitle,
    EditShelfTitle,
    ShelfCreated { title: String },
    ShelfChanged { title: String },
    FormDatabaseError { error: String },
    ShelfUnavailable,
    ShelfTitle { name: String },
    LoginRequired,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::InvalidShelf => f.write_str("Invalid shelf specified"),
            Message::AddNotAllowed => {
                f.write_str("Sorry you are not allowed to add a book to that shelf")
            }
            Message::EditNotAllowed => f.write_str("Sorry you are not allowed to edit this shelf"),
            Message::AlreadyOnShelf { shelf } => {
                write!(f, "Book is already part of the shelf: {shelf}")
            }
            Message::InvalidBookId { book_id } => write!(
                f,
                "{book_id} is an invalid Book Id. Could not be added to Shelf"
            ),
            Message::AddDatabaseError { error } => write!(f, "Oops! Database Error: {error}."),
            Message::BookAdded { shelf } => write!(f, "Book has been added to shelf: {shelf}"),
            Message::CreateShelfTitle => f.write_str("Create a Shelf"),
            Message::EditShelfTitle => f.write_str("Edit a shelf"),
            Message::ShelfCreated { title } => write!(f, "Shelf {title} created"),
            Message::ShelfChanged { title } => write!(f, "Shelf {title} changed"),
            Message::FormDatabaseError { error } => write!(f, "Database error: {error}"),
            Message::ShelfUnavailable => {
                f.write_str("Error opening shelf. Shelf does not exist or is not accessible")
            }
            Message::ShelfTitle { name } => write!(f, "Shelf: '{name}'"),
            Message::LoginRequired => f.write_str("Please log in to manage shelves"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_interpolate_arguments() {
        assert_eq!(
            Message::AlreadyOnShelf {
                shelf: "Sci-Fi".to_string()
            }
            .to_string(),
            "Book is already part of the shelf: Sci-Fi"
        );
        assert_eq!(
            Message::InvalidBookId { book_id: 12 }.to_string(),
            "12 is an invalid Book Id. Could not be added to Shelf"
        );
        assert_eq!(
            Message::ShelfTitle {
                name: "Poetry".to_string()
            }
            .to_string(),
            "Shelf: 'Poetry'"
        );
    }
}
