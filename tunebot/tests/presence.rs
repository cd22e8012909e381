//! Integration tests for presence sync, voice release and the now-playing display.

mod common;

use std::time::Duration;

use common::{FakeGateway, FakeRoom, attach, bot, test_config, wait_until};
use tunebot::audio::Track;
use tunebot::config::BotConfig;
use tunebot::gateway::{Activity, ActivityKind, RoomId};

mod presence {
    use super::*;

    #[tokio::test]
    async fn test_matching_activity_sends_nothing() {
        let bot = bot(test_config());
        let gateway = FakeGateway::new(vec![]);
        gateway.show_activity(Some(Activity::playing("!help")));
        attach(&bot, &gateway);

        assert!(!bot.sync_presence());
        assert_eq!(gateway.activity_updates(), 0);
    }

    #[tokio::test]
    async fn test_different_activity_is_replaced_once() {
        let bot = bot(BotConfig {
            game: "listening to jazz".to_string(),
            ..test_config()
        });
        let gateway = FakeGateway::new(vec![]);
        gateway.show_activity(Some(Activity::playing("something else")));
        attach(&bot, &gateway);

        assert!(bot.sync_presence());
        assert!(!bot.sync_presence());

        assert_eq!(gateway.activity_updates(), 1);
        assert_eq!(
            gateway.shown_activity(),
            Some(Activity::new(ActivityKind::Listening, "jazz"))
        );
    }

    #[tokio::test]
    async fn test_none_clears_a_shown_activity() {
        let bot = bot(BotConfig {
            game: "none".to_string(),
            ..test_config()
        });
        let gateway = FakeGateway::new(vec![]);
        attach(&bot, &gateway);

        // Nothing shown and nothing wanted.
        assert!(!bot.sync_presence());

        gateway.show_activity(Some(Activity::playing("leftover")));
        assert!(bot.sync_presence());
        assert_eq!(gateway.shown_activity(), None);
        assert_eq!(gateway.activity_updates(), 1);
    }

    #[tokio::test]
    async fn test_song_in_status_mirrors_single_playing_room() {
        let bot = bot(BotConfig {
            song_in_status: true,
            ..test_config()
        });
        let gateway = FakeGateway::new(vec![FakeRoom::new(1)]);
        attach(&bot, &gateway);

        let session = bot.player_manager().set_up_handler(RoomId(1));
        let track = Track::new("Blue in Green", "Miles Davis", "uri", Duration::from_secs(300));
        session.enqueue(track.clone()).expect("enqueue failed");

        bot.nowplaying_handler().on_track_update(Some(&track));
        assert_eq!(
            gateway.shown_activity(),
            Some(Activity::listening("Blue in Green"))
        );

        session.stop_and_clear();
        bot.nowplaying_handler().on_track_update(None);
        assert_eq!(
            gateway.shown_activity(),
            Some(Activity::playing("!help"))
        );
    }
}

mod voice {
    use super::*;

    #[tokio::test]
    async fn test_unknown_room_schedules_nothing() {
        let bot = bot(test_config());
        let gateway = FakeGateway::new(vec![FakeRoom::new(1)]);
        attach(&bot, &gateway);

        assert!(!bot.close_voice_connection(RoomId(99)));
        assert_eq!(bot.scheduler().submitted_count(), 0);
    }

    #[tokio::test]
    async fn test_known_room_closes_in_background() {
        let bot = bot(test_config());
        let room = FakeRoom::new(1);
        let gateway = FakeGateway::new(vec![room.clone()]);
        attach(&bot, &gateway);

        assert!(bot.close_voice_connection(RoomId(1)));
        assert_eq!(bot.scheduler().submitted_count(), 1);

        wait_until(|| room.closes() == 1).await;
    }

    #[tokio::test]
    async fn test_detached_gateway_makes_presence_and_voice_noops() {
        let bot = bot(test_config());
        let room = FakeRoom::new(1);
        let gateway = FakeGateway::new(vec![room.clone()]);
        gateway.show_activity(Some(Activity::playing("something else")));
        attach(&bot, &gateway);

        bot.detach_gateway();
        assert!(bot.gateway().is_none());

        assert!(!bot.sync_presence());
        assert!(!bot.close_voice_connection(RoomId(1)));
        assert_eq!(gateway.activity_updates(), 0);
        assert_eq!(bot.scheduler().submitted_count(), 0);
        assert_eq!(room.closes(), 0);

        // Re-attaching restores both.
        attach(&bot, &gateway);
        assert!(bot.sync_presence());
        assert!(bot.close_voice_connection(RoomId(1)));
        wait_until(|| room.closes() == 1).await;
    }

    #[tokio::test]
    async fn test_failed_close_is_swallowed() {
        let bot = bot(test_config());
        let failing = FakeRoom::failing(1);
        let healthy = FakeRoom::new(2);
        let gateway = FakeGateway::new(vec![failing.clone(), healthy.clone()]);
        attach(&bot, &gateway);

        assert!(bot.close_voice_connection(RoomId(1)));
        assert!(bot.close_voice_connection(RoomId(2)));

        // The worker keeps going after the first task fails.
        wait_until(|| healthy.closes() == 1).await;
        assert_eq!(failing.closes(), 1);
    }
}

mod nowplaying {
    use super::*;

    #[tokio::test]
    async fn test_unchanged_topic_is_pushed_once() {
        let bot = bot(test_config());
        let room = FakeRoom::new(1);
        let gateway = FakeGateway::new(vec![room.clone()]);
        attach(&bot, &gateway);

        let session = bot.player_manager().set_up_handler(RoomId(1));
        session
            .enqueue(Track::new("Song", "Band", "uri", Duration::from_secs(60)))
            .expect("enqueue failed");

        let nowplaying = bot.nowplaying_handler();
        assert!(nowplaying.push_update(RoomId(1), &session, false).await.unwrap());
        assert!(!nowplaying.push_update(RoomId(1), &session, false).await.unwrap());

        session.set_paused(true);
        assert!(nowplaying.push_update(RoomId(1), &session, false).await.unwrap());

        assert_eq!(room.topics(), vec!["\u{25b6} Song - Band", "\u{23f8} Song - Band"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_refresh_updates_topics() {
        let bot = bot(BotConfig {
            update_interval_secs: 5,
            ..test_config()
        });
        let room = FakeRoom::new(1);
        let gateway = FakeGateway::new(vec![room.clone()]);
        attach(&bot, &gateway);

        bot.player_manager()
            .set_up_handler(RoomId(1))
            .enqueue(Track::new("Song", "Band", "uri", Duration::from_secs(60)))
            .expect("enqueue failed");

        tokio::time::sleep(Duration::from_secs(11)).await;

        // Several refreshes ran, but the text only changed once.
        assert_eq!(room.topics(), vec!["\u{25b6} Song - Band"]);

        bot.shutdown().await;
        assert_eq!(
            room.topics(),
            vec!["\u{25b6} Song - Band", "\u{23f9} Playback stopped"]
        );
    }
}
