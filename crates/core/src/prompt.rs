use crate::models::ValidatedItinerary;

const INTEREST_SEPARATOR: &str = ", ";

pub fn render_prompt(itinerary: &ValidatedItinerary) -> String {
    format!(
        "You are a friendly travel planner. Create a detailed {days}-day itinerary for the city \"{city}\".\n\
         User interests: {interests}.\n\
         Return a clear, day-by-day plan with short descriptions and a few concrete suggestions (1-2 places per half-day).\n\
         Keep language concise and helpful.\n\
         Label days as \"Day 1\", \"Day 2\", etc.\n",
        days = itinerary.days,
        city = itinerary.city,
        interests = itinerary.interests.join(INTEREST_SEPARATOR),
    )
}
