//! Static fallback dataset for the NBA stats provider.
//!
//! The stats upstream intermittently refuses non-browser traffic, so team
//! listings degrade to this fixed table instead of failing callers. The
//! substitution is value-level: callers receive ordinary `Team` records and
//! cannot tell (nor need to) that the live call was skipped.

use crate::data::models::Team;

/// (id, name, abbreviation, city, conference, division)
const NBA_TEAMS: &[(&str, &str, &str, &str, &str, &str)] = &[
    // Eastern Conference - Atlantic
    ("1610612738", "Boston Celtics", "BOS", "Boston", "East", "Atlantic"),
    ("1610612751", "Brooklyn Nets", "BKN", "Brooklyn", "East", "Atlantic"),
    ("1610612752", "New York Knicks", "NYK", "New York", "East", "Atlantic"),
    ("1610612755", "Philadelphia 76ers", "PHI", "Philadelphia", "East", "Atlantic"),
    ("1610612761", "Toronto Raptors", "TOR", "Toronto", "East", "Atlantic"),
    // Eastern Conference - Central
    ("1610612741", "Chicago Bulls", "CHI", "Chicago", "East", "Central"),
    ("1610612739", "Cleveland Cavaliers", "CLE", "Cleveland", "East", "Central"),
    ("1610612765", "Detroit Pistons", "DET", "Detroit", "East", "Central"),
    ("1610612754", "Indiana Pacers", "IND", "Indiana", "East", "Central"),
    ("1610612749", "Milwaukee Bucks", "MIL", "Milwaukee", "East", "Central"),
    // Eastern Conference - Southeast
    ("1610612737", "Atlanta Hawks", "ATL", "Atlanta", "East", "Southeast"),
    ("1610612766", "Charlotte Hornets", "CHA", "Charlotte", "East", "Southeast"),
    ("1610612748", "Miami Heat", "MIA", "Miami", "East", "Southeast"),
    ("1610612753", "Orlando Magic", "ORL", "Orlando", "East", "Southeast"),
    ("1610612764", "Washington Wizards", "WAS", "Washington", "East", "Southeast"),
    // Western Conference - Northwest
    ("1610612743", "Denver Nuggets", "DEN", "Denver", "West", "Northwest"),
    ("1610612750", "Minnesota Timberwolves", "MIN", "Minnesota", "West", "Northwest"),
    ("1610612760", "Oklahoma City Thunder", "OKC", "Oklahoma City", "West", "Northwest"),
    ("1610612757", "Portland Trail Blazers", "POR", "Portland", "West", "Northwest"),
    ("1610612762", "Utah Jazz", "UTA", "Utah", "West", "Northwest"),
    // Western Conference - Pacific
    ("1610612744", "Golden State Warriors", "GSW", "Golden State", "West", "Pacific"),
    ("1610612746", "LA Clippers", "LAC", "Los Angeles", "West", "Pacific"),
    ("1610612747", "Los Angeles Lakers", "LAL", "Los Angeles", "West", "Pacific"),
    ("1610612756", "Phoenix Suns", "PHX", "Phoenix", "West", "Pacific"),
    ("1610612758", "Sacramento Kings", "SAC", "Sacramento", "West", "Pacific"),
    // Western Conference - Southwest
    ("1610612742", "Dallas Mavericks", "DAL", "Dallas", "West", "Southwest"),
    ("1610612745", "Houston Rockets", "HOU", "Houston", "West", "Southwest"),
    ("1610612763", "Memphis Grizzlies", "MEM", "Memphis", "West", "Southwest"),
    ("1610612740", "New Orleans Pelicans", "NOP", "New Orleans", "West", "Southwest"),
    ("1610612759", "San Antonio Spurs", "SAS", "San Antonio", "West", "Southwest"),
];

pub fn nba_teams() -> Vec<Team> {
    NBA_TEAMS
        .iter()
        .map(|&(id, name, short_name, city, conference, division)| Team {
            id: id.to_string(),
            name: name.to_string(),
            short_name: short_name.to_string(),
            city: city.to_string(),
            league: "NBA".to_string(),
            conference: Some(conference.to_string()),
            division: Some(division.to_string()),
            logo_url: None,
            primary_color: None,
            secondary_color: None,
            venue: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fallback_covers_all_thirty_teams() {
        let teams = nba_teams();
        assert_eq!(teams.len(), 30);

        let ids: HashSet<_> = teams.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), 30);

        let east = teams
            .iter()
            .filter(|t| t.conference.as_deref() == Some("East"))
            .count();
        assert_eq!(east, 15);
    }

    #[test]
    fn test_fallback_is_stable_between_calls() {
        assert_eq!(nba_teams(), nba_teams());
    }
}
