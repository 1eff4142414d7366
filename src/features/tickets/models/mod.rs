mod ticket;

pub use ticket::{
    AnimalDetails, CurrentLocation, Documentation, Evidence, HasDocumentation, LegacyFields,
    OriginalLocation, PersonalStatement, RemovalDetails, RescueOrProtect, SubmitterInfo, Ticket,
    TicketDetails, VoteDirection, Voter, STATUS_PENDING,
};
