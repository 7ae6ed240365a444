pub mod book_graph;
