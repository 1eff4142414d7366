mod ticket_dto;

pub use ticket_dto::{
    CreateTicketDto, ReviewTicketDto, TicketResponseDto, VoteTicketDto, VoterDto,
};
