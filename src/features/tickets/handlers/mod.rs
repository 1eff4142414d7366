pub mod ticket_handler;

pub use ticket_handler::{
    __path_get_ticket, __path_list_tickets, __path_review_ticket, __path_submit_ticket,
    __path_vote_ticket, get_ticket, list_tickets, review_ticket, submit_ticket, vote_ticket,
};
